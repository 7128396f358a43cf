//! `tarn prompt` — interactive front end.
//!
//! Asks for an operation and its parameters, then runs the same request the
//! `add` and `install` subcommands would. Invalid input ends the session
//! before anything is touched.

use std::io::{BufRead, Write};

use anyhow::{bail, Result};
use tarn_install::{Installer, Operation, Request};

use super::dispatch;

/// Read one request from `input`, then execute it.
pub fn run(installer: &Installer, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let request = read_request(input, out)?;
    dispatch(installer, request, out)
}

/// Ask the questions for one request.
pub fn read_request(input: &mut impl BufRead, out: &mut impl Write) -> Result<Request> {
    let command = ask(input, out, "Enter command (add or install): ")?;
    match command.parse::<Operation>()? {
        Operation::Install => Ok(Request::Materialize),
        Operation::Add => {
            let name = ask(input, out, "Enter package name: ")?;
            if name.is_empty() {
                bail!("package name cannot be empty");
            }
            let answer = ask(input, out, "Is this a development dependency? (yes/no): ")?;
            let dev = match answer.to_lowercase().as_str() {
                "yes" => true,
                "no" => false,
                _ => bail!("invalid input for dependency type, please enter \"yes\" or \"no\""),
            };
            Ok(Request::Register { name, dev })
        }
    }
}

fn ask(input: &mut impl BufRead, out: &mut impl Write, question: &str) -> Result<String> {
    write!(out, "{question}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("no input (stdin closed)");
    }
    Ok(line.trim().to_string())
}
