//! Status display trait

use crate::state::StateTree;

/// Something that can show the device state
pub trait StatusDisplay {
    type Error;

    /// Redraw from the current state
    fn render(&mut self, state: &StateTree) -> Result<(), Self::Error>;

    /// Whether a screen is attached
    fn is_present(&self) -> bool {
        true
    }
}

/// An absent display renders nothing
impl<D: StatusDisplay> StatusDisplay for Option<D> {
    type Error = D::Error;

    fn render(&mut self, state: &StateTree) -> Result<(), Self::Error> {
        match self {
            Some(display) => display.render(state),
            None => Ok(()),
        }
    }

    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(|display| display.is_present())
    }
}
