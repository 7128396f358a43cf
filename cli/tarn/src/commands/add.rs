//! `tarn add` — record a dependency at its latest version.

use std::io::Write;

use anyhow::Result;
use tarn_install::{Installer, Registered};

/// Print the entry written by a register request.
pub fn report(installer: &Installer, registered: &Registered, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "Added {}@{} to {} in {}",
        registered.name,
        registered.version,
        registered.group,
        installer.manifest_store().path().display()
    )?;
    writeln!(out, "Run `tarn install` to download it.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tarn_install::{DependencyGroup, InstallerConfig};
    use tarn_registry::LocalRegistry;

    use super::*;

    #[test]
    fn report_names_group_and_manifest() {
        let installer = Installer::new(
            InstallerConfig::for_project(Path::new("/work/app")),
            Box::new(LocalRegistry::new("/work/registry".into())),
        );
        let registered = Registered {
            name: "foo".to_string(),
            version: "1.2.3".to_string(),
            group: DependencyGroup::DevDependencies,
        };

        let mut out = Vec::new();
        report(&installer, &registered, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Added foo@1.2.3 to devDependencies in /work/app/package.json\n"));
    }
}
