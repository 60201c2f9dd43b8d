pub mod config;
pub mod content;
pub mod sources;

use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use lodestar_core::{ProviderError, ProviderResult, RecoverExt};

/// What end users see when a provider call fails. Diagnostic detail only
/// goes to the log.
pub fn user_message(err: &ProviderError) -> &'static str {
    if err.is_busy() {
        "That feature is busy right now, try again in a moment."
    } else {
        "This feature is temporarily unavailable, please try again later."
    }
}

/// Run a provider call, retrying briefly while the provider is busy
/// refilling. Any other error is returned on the first failure.
pub async fn call<T, F, Fut>(context: &str, op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let result = op
        .retry(
            ConstantBuilder::default()
                .with_delay(Duration::from_millis(250))
                .with_max_times(3),
        )
        .when(|e: &ProviderError| e.is_busy())
        .notify(|e: &ProviderError, delay: Duration| {
            log::debug!("{}: {}, retrying in {:?}", context, e, delay);
        })
        .await;

    result
        .inspect_err(|e| println!("{}", user_message(e)))
        .recover(context)
}
