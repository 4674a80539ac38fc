use svckit::service;

#[service(lifetime = scoped, lifetime = transient)]
pub struct Clock;

fn main() {}
