use svckit::service;

#[service(ctor = Clock::new())]
pub struct Clock;

fn main() {}
