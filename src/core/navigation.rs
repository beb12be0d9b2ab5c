use crate::utils::location::Location;

/// Access to the location the client was launched with.
pub trait Navigator {
    fn location(&self) -> &Location;

    /// Replace the current location in place, without adding a history entry.
    fn replace(&mut self, location: Location);
}

/// Navigator for command-line launches: the location comes from `--open`
/// and lives for the whole process, so a replacement is still in effect
/// when startup is re-run.
#[derive(Debug, Clone, Default)]
pub struct LaunchNavigator {
    location: Location,
}

impl LaunchNavigator {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl Navigator for LaunchNavigator {
    fn location(&self) -> &Location {
        &self.location
    }

    fn replace(&mut self, location: Location) {
        self.location = location;
    }
}
