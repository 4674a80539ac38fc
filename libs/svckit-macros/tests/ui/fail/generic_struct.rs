use svckit::service;

#[service]
pub struct Cache<T>(T);

fn main() {}
