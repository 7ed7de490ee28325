//! Route53 transport: trait seam plus the signed REST implementation

pub mod credentials;
pub mod route53;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use credentials::Route53Credentials;
pub use route53::Route53Client;
pub use traits::{
    ChangeAction, RecordChange, RecordChangeBatch, RecordSetCursor, RecordSetPage,
    ResourceRecordSet, Route53Api,
};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockRoute53;
