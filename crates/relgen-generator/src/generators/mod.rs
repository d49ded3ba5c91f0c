//! Individual value generators, one per column source kind.

pub mod constant;
pub mod expression;
pub mod identity;
pub mod range;
pub mod uuid;
pub mod value_set;

pub use constant::ConstantGenerator;
pub use expression::ExpressionGenerator;
pub use identity::BatchedIdGenerator;
pub use range::RangeGenerator;
pub use uuid::UuidGenerator;
pub use value_set::ValueSetGenerator;
