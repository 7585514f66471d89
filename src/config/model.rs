//! Active options with a one-level save/restore slot.
//!
//! AMP documents push an override profile for the duration of their pass and
//! pop it afterwards. Nesting is not supported: a second push while an
//! override is active is refused.

use std::ops::Deref;

use super::Options;

#[derive(Debug, Clone)]
pub struct OptionsModel {
    active: Options,
    backup: Option<Options>,
}

impl OptionsModel {
    pub fn new(options: Options) -> Self {
        Self {
            active: options,
            backup: None,
        }
    }

    /// Save the current options and apply `change` on top.
    ///
    /// Returns false (and changes nothing) if an override is already active.
    pub fn push_override(&mut self, change: impl FnOnce(&mut Options)) -> bool {
        if self.backup.is_some() {
            return false;
        }
        self.backup = Some(self.active.clone());
        change(&mut self.active);
        true
    }

    /// Restore the options saved by [`push_override`](Self::push_override).
    pub fn restore(&mut self) -> bool {
        match self.backup.take() {
            Some(saved) => {
                self.active = saved;
                true
            }
            None => false,
        }
    }

    pub fn is_overridden(&self) -> bool {
        self.backup.is_some()
    }

    pub fn options(&self) -> &Options {
        &self.active
    }
}

impl Deref for OptionsModel {
    type Target = Options;

    fn deref(&self) -> &Options {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_and_restore() {
        let mut model = OptionsModel::new(Options::default());
        assert!(model.push_override(Options::apply_amp_profile));
        assert!(model.is_overridden());
        assert!(!model.enable_lazyloading);

        assert!(model.restore());
        assert!(model.enable_lazyloading);
        assert_eq!(model.options(), &Options::default());
    }

    #[test]
    fn test_single_level_only() {
        let mut model = OptionsModel::new(Options::default());
        assert!(model.push_override(|o| o.debug_mode = true));
        assert!(!model.push_override(|o| o.minify_output_html = false));
        assert!(model.minify_output_html);

        assert!(model.restore());
        assert!(!model.debug_mode);
        assert!(!model.restore());
    }
}
