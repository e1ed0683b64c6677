//! [`Handler`] abstractions.

use std::future::Future;

/// Asynchronously executable handler of some operation.
pub trait Handler<Args = ()> {
    /// Value produced by a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
