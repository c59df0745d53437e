use llm_openai::StreamEvent;
use tokio::sync::mpsc;

/// Accumulate streamed completion deltas and periodically flush the text
/// so far through `flush`, batching `flush_every` deltas per update to
/// stay under Slack's edit-rate limits.
///
/// A stop signal always triggers one final flush so the tail of the
/// response is never dropped, whatever the batch counter says. If the
/// stream ends without a stop signal the accumulated text is returned
/// as-is, with no final update. Flush failures abort the relay.
pub async fn relay_stream<F, Fut, E>(
    mut rx: mpsc::Receiver<StreamEvent>,
    flush_every: usize,
    mut flush: F,
) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let mut accumulated = String::new();
    let mut pending: usize = 0;

    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Delta(text) => {
                accumulated.push_str(&text);
                pending += 1;
                if pending >= flush_every {
                    flush(accumulated.clone()).await?;
                    pending = 0;
                }
            }
            StreamEvent::Stop => {
                flush(accumulated.clone()).await?;
                return Ok(accumulated);
            }
        }
    }

    Ok(accumulated)
}
