// Convention-only candidate with capabilities
use svckit::injectable;

pub trait OrderRepository: Send + Sync {}

#[injectable(implements = [dyn OrderRepository])]
pub struct SqlOrderRepository;

impl OrderRepository for SqlOrderRepository {}

svckit::declare_capability!(dyn OrderRepository);

fn main() {}
