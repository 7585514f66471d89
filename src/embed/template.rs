//! Embedded text with `__NAME__` placeholders.
//!
//! A [`Template`] is tied to the variable set that fills it, so a template
//! can only be rendered with the values it was written for.

use std::marker::PhantomData;

/// Values for the placeholders of one template.
pub trait TemplateVars {
    /// `(placeholder, replacement)` pairs; placeholders include the
    /// surrounding underscores.
    fn placeholders(&self) -> Vec<(&'static str, String)>;
}

#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _vars: PhantomData<fn(&V)>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _vars: PhantomData,
        }
    }

    pub const fn content(&self) -> &'static str {
        self.content
    }
}

impl<V: TemplateVars> Template<V> {
    /// Substitute every placeholder. Unknown `__X__` sequences stay as is.
    pub fn render(&self, vars: &V) -> String {
        vars.placeholders()
            .into_iter()
            .fold(self.content.to_string(), |text, (name, value)| {
                text.replace(name, &value)
            })
    }
}
