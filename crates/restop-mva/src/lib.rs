//! # restop-mva
//!
//! Boosted decision tree discriminants for `restop`. The [`Bdt`] type evaluates forests
//! trained with TMVA, read from their XML weight files, and can store the parsed forest in a
//! compact binary cache.
#![warn(clippy::perf, clippy::style)]

use std::path::{Path, PathBuf};

use restop_core::RestopResult;

/// Forest storage and evaluation.
pub mod bdt;
/// Reader for TMVA `MethodSetup` weight files.
pub mod tmva;

pub use bdt::{test_bdt, Bdt, BoostType, DecisionTree, Leaf, Node, TEST_WEIGHTS};

fn expand_path(file_path: &str) -> RestopResult<PathBuf> {
    Ok(PathBuf::from(&*shellexpand::full(file_path)?))
}

/// Load a [`Bdt`] from either a TMVA XML weight file (`.xml`) or a binary cache written by
/// [`Bdt::save`] (any other extension). The `name` labels the method and is only used for
/// weight files, since caches already carry one.
///
/// # Errors
///
/// Fails if the file cannot be read or does not describe a valid forest. There is no way to
/// score candidates without a model, so callers should treat this as fatal.
pub fn load(file_path: &str, name: &str) -> RestopResult<Bdt> {
    let path = expand_path(file_path)?;
    if is_xml(&path) {
        Bdt::from_tmva_xml(file_path, name)
    } else {
        Bdt::load(file_path)
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use restop_core::Discriminant;

    use super::*;

    #[test]
    fn test_is_xml() {
        assert!(is_xml(Path::new("resTop_xGBoost_v2.weights.xml")));
        assert!(is_xml(Path::new("/tmp/MODEL.XML")));
        assert!(!is_xml(Path::new("model.bin")));
        assert!(!is_xml(Path::new("model")));
    }

    #[test]
    fn test_load_dispatch() {
        let dir = std::env::temp_dir();
        let xml_path = dir.join(format!("restop-load-{}.weights.xml", std::process::id()));
        std::fs::write(&xml_path, TEST_WEIGHTS).unwrap();
        let from_xml = load(xml_path.to_str().unwrap(), "BDT").unwrap();
        let bin_path = dir.join(format!("restop-load-{}.bin", std::process::id()));
        from_xml.save(bin_path.to_str().unwrap()).unwrap();
        let from_bin = load(bin_path.to_str().unwrap(), "ignored").unwrap();
        assert_eq!(from_bin.name(), "BDT");
        assert_eq!(from_bin.n_trees(), from_xml.n_trees());
        std::fs::remove_file(xml_path).unwrap();
        std::fs::remove_file(bin_path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load("/nonexistent/restop/model.xml", "BDT").is_err());
        assert!(load("/nonexistent/restop/model.bin", "BDT").is_err());
    }
}
