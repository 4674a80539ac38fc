use svckit::service;

#[service(lifetim = scoped)]
pub struct Clock;

fn main() {}
