// Marker with explicit key, scoped lifetime and declared capabilities
use svckit::service;

pub trait PaymentGateway: Send + Sync {}
pub trait Refunds: Send + Sync {}

#[service(
    key = dyn PaymentGateway,
    lifetime = scoped,
    as_self = false,
    implements = [dyn PaymentGateway, dyn Refunds]
)]
pub struct PaymentService;

impl PaymentGateway for PaymentService {}
impl Refunds for PaymentService {}

#[service]
pub struct Clock;

fn main() {}
