//! `optdeps version`

use miette::Result;
use optdeps_core::version::version_string;
use optdeps_core::VERSION;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        super::print_json(&VersionOutput { version: VERSION })
    } else {
        println!("{}", version_string());
        Ok(())
    }
}
