//! Various utilities.

use failure::{format_err, Fallible};
use log::error;

/// Logs an error, including its causes and backtrace (if possible).
pub fn log_err(err: &failure::Error) {
    let mut first = true;
    let num_errs = err.iter_chain().count();
    if num_errs <= 1 {
        error!("{}", err);
    } else {
        for cause in err.iter_chain() {
            if first {
                first = false;
                error!("           {}", cause);
            } else {
                error!("caused by: {}", cause);
            }
        }
    }
    let bt = err.backtrace().to_string();
    if !bt.is_empty() {
        error!("{}", bt);
    }
}

/// Runs a blocking closure on tokio's blocking thread pool, so that database and filesystem work
/// doesn't stall the executor.
pub async fn blocking<F, T>(func: F) -> Fallible<T>
where
    F: 'static + Send + FnOnce() -> Fallible<T>,
    T: 'static + Send,
{
    tokio::task::spawn_blocking(func)
        .await
        .map_err(|err| format_err!("Blocking task failed: {}", err))?
}

/// The type of a responder. Every route resolves to the same response type, so routes can be
/// `or`-ed and `unify`-ed freely.
macro_rules! Resp {
    () => { warp::filters::BoxedFilter<(warp::reply::Response,)> };
}
