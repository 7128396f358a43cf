//! CLI command implementations.

pub mod add;
pub mod install;
pub mod prompt;

use std::io::Write;

use anyhow::{Context, Result};
use tarn_install::{Installer, Request, Response};

/// Run a decoded request and print its outcome to `out`.
pub fn dispatch(installer: &Installer, request: Request, out: &mut impl Write) -> Result<()> {
    let context = match &request {
        Request::Register { name, .. } => format!("could not add {name}"),
        Request::Materialize => "could not install dependencies".to_string(),
    };
    let response = installer.handle(request).context(context)?;

    match response {
        Response::Registered(registered) => add::report(installer, &registered, out),
        Response::Materialized(report) => install::report(&report, out),
    }
}
