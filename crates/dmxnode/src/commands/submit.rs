//! `dmxnode submit`: edit fields of one form and save it to the device.

use dmxnode_core::{Console, FormTarget};

use crate::cli::{GlobalOpts, OutputFormat, SubmitArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

pub async fn handle(
    console: &Console,
    args: SubmitArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let target = FormTarget::from(args.form);

    // Parse everything before touching the device.
    let edits = args
        .set
        .iter()
        .map(|raw| util::parse_assignment(raw))
        .collect::<Result<Vec<_>, _>>()?;

    // Edits land on top of the device's current values, so wait for them.
    let state = console.wait_for_config(util::wait_timeout(console)).await?;

    for (key, value) in edits {
        let binding = state
            .fields
            .get(key)
            .ok_or_else(|| CliError::UnknownField { key: key.into() })?;
        if binding.form != Some(target) {
            return Err(CliError::WrongForm {
                key: key.into(),
                form: target.to_string(),
            });
        }
        console.edit(key, value)?;
    }

    console.submit_form(target).await?;

    let painter = Painter::new(global.color);
    match global.output {
        OutputFormat::Json => {
            let fields = console.snapshot().fields.collect_form(target);
            let rendered = serde_json::to_string_pretty(&serde_json::Value::Object(fields))?;
            output::print_output(&rendered, global.quiet);
        }
        OutputFormat::Text => {
            if let Some(toast) = console.notifications().current() {
                output::print_output(&painter.toast(&toast), global.quiet);
            }
        }
    }
    Ok(())
}
