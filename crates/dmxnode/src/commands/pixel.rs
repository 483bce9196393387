//! `dmxnode pixel-test`: switch the pixel output into a test pattern.

use dmxnode_core::{Console, PixelTestIndicator};

use crate::cli::{GlobalOpts, OutputFormat, PixelTestArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

pub async fn handle(
    console: &Console,
    args: &PixelTestArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let timeout = util::wait_timeout(console);
    console.wait_connected(timeout).await?;

    let mut states = console.state_changes();
    console.set_pixel_test(args.mode);

    // The device answers with a pixel_test confirmation; wait for it so the
    // message is not lost to an early shutdown.
    let confirmed = tokio::time::timeout(
        timeout,
        states.wait_for(|s| s.pixel_test != PixelTestIndicator::Idle),
    )
    .await;

    let indicator = match confirmed {
        Ok(Ok(state)) => state.pixel_test,
        Ok(Err(_)) => return Err(CliError::Disconnected),
        Err(_) => {
            tracing::warn!(mode = args.mode, "device did not confirm the pixel test");
            PixelTestIndicator::Idle
        }
    };

    let rendered = match global.output {
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "mode": args.mode,
            "pixelTest": indicator.to_string(),
        }))?,
        OutputFormat::Text => {
            let painter = Painter::new(global.color);
            match indicator {
                PixelTestIndicator::Running => painter.good(&indicator.to_string()),
                PixelTestIndicator::Failed => painter.bad(&indicator.to_string()),
                PixelTestIndicator::Idle => painter.dim(&format!("mode {} sent", args.mode)),
            }
        }
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}
