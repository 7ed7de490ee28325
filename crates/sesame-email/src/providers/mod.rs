//! SES provider abstraction and the aws-sdk-ses implementation

mod ses;
mod traits;

#[cfg(test)]
pub mod mock;

pub use ses::SesClient;
pub use traits::*;

#[cfg(test)]
pub use mock::MockSesApi;
