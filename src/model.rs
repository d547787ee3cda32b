use std::fmt;
use std::path::{Path, PathBuf};

/// A benchmark model: the model file plus its optional constants and
/// properties file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    model_file: PathBuf,
    constants: Option<String>,
    properties_file: Option<PathBuf>,
}

impl Model {
    pub fn new(
        model_file: PathBuf,
        constants: Option<String>,
        properties_file: Option<PathBuf>,
    ) -> Self {
        let constants = constants.filter(|value| !value.is_empty());
        Self {
            model_file,
            constants,
            properties_file,
        }
    }

    pub fn model_file(&self) -> &Path {
        &self.model_file
    }

    pub fn constants(&self) -> Option<&str> {
        self.constants.as_deref()
    }

    pub fn properties_file(&self) -> Option<&Path> {
        self.properties_file.as_deref()
    }

    /// File name of the model, used for filtering and sorting.
    pub fn name(&self) -> String {
        self.model_file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.model_file.display().to_string())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.constants().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_file_name_and_display_adds_constants() {
        let model = Model::new(
            PathBuf::from("/bench/models/brp.prism"),
            Some("N=16,MAX=2".to_string()),
            None,
        );
        assert_eq!(model.name(), "brp.prism");
        assert_eq!(model.to_string(), "brp.prism(N=16,MAX=2)");
    }

    #[test]
    fn empty_constants_are_treated_as_absent() {
        let model = Model::new(PathBuf::from("zeroconf.prism"), Some(String::new()), None);
        assert_eq!(model.constants(), None);
        assert_eq!(model.to_string(), "zeroconf.prism()");
    }
}
