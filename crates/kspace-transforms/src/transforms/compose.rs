//! Sequential composition of transform stages.

use super::Transform;
use crate::error::Result;
use crate::sample::Sample;

/// Ordered sequence of stages applied one after another.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    /// Run every stage in order. The first failing stage aborts the run and
    /// its error is returned; the partially transformed sample is dropped.
    pub fn apply(&self, mut sample: Sample) -> Result<Sample> {
        for transform in &self.transforms {
            tracing::trace!("{}: applying {}", sample.filename(), transform.name());
            if let Err(e) = transform.apply(&mut sample) {
                tracing::debug!(
                    "{}: transform {} failed: {}",
                    sample.filename(),
                    transform.name(),
                    e
                );
                return Err(e);
            }
        }
        Ok(sample)
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl std::fmt::Display for Compose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Compose(")?;
        for transform in &self.transforms {
            write!(f, "\n    {}", transform.name())?;
        }
        write!(f, "\n)")
    }
}

impl std::fmt::Debug for Compose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compose")
            .field("transforms", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::sample::{Key, Value};

    struct Add(f32);

    impl Transform for Add {
        fn name(&self) -> &'static str {
            "Add"
        }

        fn apply(&self, sample: &mut Sample) -> Result<()> {
            let v = sample.scalar(Key::ScalingFactor, "Add").unwrap_or(0.0);
            sample.insert(Key::ScalingFactor, Value::Scalar(v * 10.0 + self.0));
            Ok(())
        }
    }

    struct Fail;

    impl Transform for Fail {
        fn name(&self) -> &'static str {
            "Fail"
        }

        fn apply(&self, _sample: &mut Sample) -> Result<()> {
            Err(TransformError::InvalidConfig("boom".into()))
        }
    }

    #[test]
    fn stages_run_in_list_order() {
        let compose = Compose::new(vec![Box::new(Add(1.0)), Box::new(Add(2.0)), Box::new(Add(3.0))]);
        let out = compose.apply(Sample::new("f")).unwrap();
        assert_eq!(out.scalar(Key::ScalingFactor, "t").unwrap(), 123.0);
    }

    #[test]
    fn failure_aborts_remaining_stages() {
        let compose = Compose::new(vec![Box::new(Add(1.0)), Box::new(Fail), Box::new(Add(2.0))]);
        let err = compose.apply(Sample::new("f")).unwrap_err();
        assert_eq!(err, TransformError::InvalidConfig("boom".into()));
    }

    #[test]
    fn display_lists_stage_names() {
        let compose = Compose::new(vec![Box::new(Add(1.0)), Box::new(Fail)]);
        assert_eq!(compose.to_string(), "Compose(\n    Add\n    Fail\n)");
        assert_eq!(compose.names(), vec!["Add", "Fail"]);
        assert!(Compose::new(Vec::new()).is_empty());
    }
}
