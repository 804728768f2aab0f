use async_trait::async_trait;
use inquire::Confirm;
use localweather_core::PermissionPrompt;

/// Asks on the terminal before looking up the location.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

#[async_trait]
impl PermissionPrompt for TerminalPrompt {
    async fn ask(&self) -> bool {
        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Allow localweather to look up your approximate location?")
                .with_default(true)
                .with_help_message("Uses your public IP address. Answer is not remembered.")
                .prompt()
        })
        .await;

        match answer {
            Ok(Ok(granted)) => granted,
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "permission prompt unavailable, treating as denied");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "permission prompt task failed");
                false
            }
        }
    }
}
