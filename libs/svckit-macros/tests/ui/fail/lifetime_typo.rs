use svckit::service;

#[service(lifetime = scopd)]
pub struct Clock;

fn main() {}
