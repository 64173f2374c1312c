//! Line commands read from stdin.

use crate::config::SceneButton;

/// A parsed panel command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch the program scene (button number or name).
    Scene(SceneTarget),
    /// Click on the slider track.
    Click(i32),
    /// Slider drag step; debounced.
    Drag(i32),
    /// Slider released.
    Release(i32),
    /// Print the current slider value.
    Volume,
    /// Spotify transport controls.
    Play,
    Pause,
    /// Pause if playing, resume otherwise.
    PlayPause,
    Next,
    Previous,
    /// List scene buttons.
    Scenes,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneTarget {
    /// 1-based button number.
    Button(usize),
    Name(String),
}

impl SceneTarget {
    /// Resolves to an OBS scene name.
    ///
    /// Button numbers and button labels map through the configured buttons;
    /// any other name is used as the scene name itself.
    pub fn resolve(&self, buttons: &[SceneButton]) -> Option<String> {
        match self {
            SceneTarget::Button(n) => n
                .checked_sub(1)
                .and_then(|i| buttons.get(i))
                .map(|b| b.scene.clone()),
            SceneTarget::Name(name) => Some(
                buttons
                    .iter()
                    .find(|b| b.label.eq_ignore_ascii_case(name))
                    .map_or_else(|| name.clone(), |b| b.scene.clone()),
            ),
        }
    }
}

pub const HELP: &str = "commands: scene <n|name>, click <v>, drag <v>, release <v>, volume, \
play, pause, toggle, next, prev, scenes, quit";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "scene" => {
            if rest.is_empty() {
                return Err("usage: scene <n|name>".into());
            }
            match rest.parse::<usize>() {
                Ok(n) => Command::Scene(SceneTarget::Button(n)),
                Err(_) => Command::Scene(SceneTarget::Name(rest.to_string())),
            }
        }
        "click" => Command::Click(parse_value(verb, rest)?),
        "drag" => Command::Drag(parse_value(verb, rest)?),
        "release" => Command::Release(parse_value(verb, rest)?),
        "volume" => Command::Volume,
        "play" => Command::Play,
        "pause" => Command::Pause,
        "toggle" | "playpause" => Command::PlayPause,
        "next" => Command::Next,
        "prev" | "previous" => Command::Previous,
        "scenes" => Command::Scenes,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(command))
}

fn parse_value(verb: &str, rest: &str) -> Result<i32, String> {
    rest.parse::<i32>()
        .map_err(|_| format!("usage: {verb} <0-100>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buttons() -> Vec<SceneButton> {
        vec![
            SceneButton {
                label: "OBS Scene 1".into(),
                scene: "Scene 1".into(),
            },
            SceneButton {
                label: "Intro".into(),
                scene: "Starting Soon".into(),
            },
        ]
    }

    #[test]
    fn parse_scene_commands() {
        assert_eq!(
            parse("scene 2").unwrap(),
            Some(Command::Scene(SceneTarget::Button(2)))
        );
        assert_eq!(
            parse("  scene   Be Right Back ").unwrap(),
            Some(Command::Scene(SceneTarget::Name("Be Right Back".into())))
        );
        assert!(parse("scene").is_err());
    }

    #[test]
    fn parse_slider_commands() {
        assert_eq!(parse("click 40").unwrap(), Some(Command::Click(40)));
        assert_eq!(parse("drag -3").unwrap(), Some(Command::Drag(-3)));
        assert_eq!(parse("RELEASE 120").unwrap(), Some(Command::Release(120)));
        assert!(parse("drag loud").is_err());
        assert!(parse("click").is_err());
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse("volume").unwrap(), Some(Command::Volume));
        assert_eq!(parse("scenes").unwrap(), Some(Command::Scenes));
        assert_eq!(parse("quit").unwrap(), Some(Command::Quit));
        assert_eq!(parse("exit").unwrap(), Some(Command::Quit));
        assert_eq!(parse("?").unwrap(), Some(Command::Help));
        assert_eq!(parse("   ").unwrap(), None);
        assert!(parse("dance").is_err());
    }

    #[test]
    fn parse_playback_commands() {
        assert_eq!(parse("play").unwrap(), Some(Command::Play));
        assert_eq!(parse("Pause").unwrap(), Some(Command::Pause));
        assert_eq!(parse("toggle").unwrap(), Some(Command::PlayPause));
        assert_eq!(parse("playpause").unwrap(), Some(Command::PlayPause));
        assert_eq!(parse("next").unwrap(), Some(Command::Next));
        assert_eq!(parse("prev").unwrap(), Some(Command::Previous));
        assert_eq!(parse("previous").unwrap(), Some(Command::Previous));
        assert!(HELP.contains("next"));
    }

    #[test]
    fn resolve_button_number() {
        let buttons = buttons();
        assert_eq!(
            SceneTarget::Button(2).resolve(&buttons).as_deref(),
            Some("Starting Soon")
        );
        assert_eq!(SceneTarget::Button(0).resolve(&buttons), None);
        assert_eq!(SceneTarget::Button(3).resolve(&buttons), None);
    }

    #[test]
    fn resolve_label_or_raw_name() {
        let buttons = buttons();
        assert_eq!(
            SceneTarget::Name("intro".into()).resolve(&buttons).as_deref(),
            Some("Starting Soon")
        );
        assert_eq!(
            SceneTarget::Name("Gameplay".into())
                .resolve(&buttons)
                .as_deref(),
            Some("Gameplay")
        );
    }
}
