//! Validate command - Check an application spec.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use suga_spec::{SpecReader, SpecValidator, ValidationResult};

#[derive(Args)]
pub struct ValidateArgs {
    /// Application spec file
    #[arg(short, long, env = "SUGA_APP", default_value = "suga.yaml")]
    pub app: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating application spec: {}", args.app.display());

    let app = SpecReader::read_application(&args.app)?;
    let result = SpecValidator::validate_application(&app);

    println!("📋 Validating {}...", app.name);
    report(&result);

    if !result.valid {
        anyhow::bail!("Validation failed with {} error(s)", result.errors.len());
    }

    println!("✅ {} resources, all checks passed", app.len());
    Ok(())
}

fn report(result: &ValidationResult) {
    if result.valid {
        println!("   ✅ Spec validation passed");
    } else {
        println!("   ❌ Spec validation failed:");
        for error in &result.errors {
            println!("      - {}", error);
        }
    }

    for warning in &result.warnings {
        println!("   ⚠️  {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_validate_duplicate_names() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("suga.yaml");
        fs::write(
            &path,
            r#"
name: shop
services:
  data:
    container:
      image:
        id: shop/data:1
buckets:
  data: {}
"#,
        )
        .unwrap();

        let err = execute(ValidateArgs { app: path }).unwrap_err();
        assert!(err.to_string().contains("Validation failed"));
    }

    #[test]
    fn test_validate_missing_file() {
        let temp = tempdir().unwrap();
        let err = execute(ValidateArgs {
            app: temp.path().join("missing.yaml"),
        })
        .unwrap_err();
        assert!(err.downcast_ref::<suga_spec::SpecError>().is_some());
    }
}
