//! `dmxnode show`: print the configuration the device reports.

use dmxnode_core::{Console, FormTarget};

use crate::cli::{GlobalOpts, ShowArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

pub async fn handle(console: &Console, args: ShowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let state = console.wait_for_config(util::wait_timeout(console)).await?;
    let form = args.form.map(FormTarget::from);

    let rendered = output::render_fields(global.output, Painter::new(global.color), &state, form)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
