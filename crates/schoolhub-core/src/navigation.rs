//! Navigation roots chosen from the session status.
//!
//! The host mounts exactly one root at a time. Screen layout is the host's
//! business; this only names the stacks and their entry screens.

use crate::session::AuthStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    // Signed-out stack
    Carousel,
    Login,
    Signup,

    // Signed-in stack
    Home,
    Explore,
    Menu,
    About,
    TermsOfService,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Carousel => "Welcome",
            Screen::Login => "Log In",
            Screen::Signup => "Sign Up",
            Screen::Home => "Home",
            Screen::Explore => "Explore",
            Screen::Menu => "Menu",
            Screen::About => "About",
            Screen::TermsOfService => "Terms of Service",
        }
    }
}

/// Tabs of the signed-in root, in display order
pub const MAIN_TABS: [Screen; 3] = [Screen::Home, Screen::Explore, Screen::Menu];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    /// Neutral waiting indicator while the startup read is pending
    Splash,
    Auth,
    Main,
}

impl Root {
    pub fn for_status(status: AuthStatus) -> Self {
        match status {
            AuthStatus::Unknown | AuthStatus::Loading => Root::Splash,
            AuthStatus::Authenticated => Root::Main,
            AuthStatus::Unauthenticated => Root::Auth,
        }
    }

    /// Screen shown when the root mounts; `None` for the splash
    pub fn initial_screen(&self) -> Option<Screen> {
        match self {
            Root::Splash => None,
            Root::Auth => Some(Screen::Carousel),
            Root::Main => Some(Screen::Home),
        }
    }

    /// Screens reachable within this root
    pub fn screens(&self) -> &'static [Screen] {
        match self {
            Root::Splash => &[],
            Root::Auth => &[Screen::Carousel, Screen::Login, Screen::Signup],
            Root::Main => &[
                Screen::Home,
                Screen::Explore,
                Screen::Menu,
                Screen::About,
                Screen::TermsOfService,
            ],
        }
    }

    pub fn contains(&self, screen: Screen) -> bool {
        self.screens().contains(&screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_for_status() {
        assert_eq!(Root::for_status(AuthStatus::Unknown), Root::Splash);
        assert_eq!(Root::for_status(AuthStatus::Loading), Root::Splash);
        assert_eq!(Root::for_status(AuthStatus::Authenticated), Root::Main);
        assert_eq!(Root::for_status(AuthStatus::Unauthenticated), Root::Auth);
    }

    #[test]
    fn test_initial_screens() {
        assert_eq!(Root::Splash.initial_screen(), None);
        assert_eq!(Root::Auth.initial_screen(), Some(Screen::Carousel));
        assert_eq!(Root::Main.initial_screen(), Some(Screen::Home));
    }

    #[test]
    fn test_stacks_are_disjoint() {
        for screen in Root::Auth.screens() {
            assert!(!Root::Main.contains(*screen), "{:?} in both stacks", screen);
        }
        for tab in MAIN_TABS {
            assert!(Root::Main.contains(tab));
        }
        assert_eq!(Screen::TermsOfService.title(), "Terms of Service");
    }
}
