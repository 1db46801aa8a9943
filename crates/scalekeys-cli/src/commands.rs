//! Line commands read from stdin

use scalekeys_core::ActiveEffect;
use scalekeys_services::OutputMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Scale { root: String, mode: String },
    Scales,
    Show,
    ShiftLeft,
    ShiftRight,
    OctaveUp,
    OctaveDown,
    /// Press and release each key in turn.
    Play(String),
    Hold(char),
    Release(char),
    Effect(ActiveEffect),
    RemoveEffect,
    LoadEffect,
    Record,
    Metronome,
    Pattern,
    Ports,
    Port(String),
    Output(OutputMode),
    Help,
    Quit,
}

pub(crate) const HELP: &str = "\
scale <root> <mode>   select a scale
scales                list roots and modes
show                  print the window
left | right          shift the window
up | down             change octave
play <keys>           press and release keys (z x c v b n m q w e r t y u i)
hold <key>            press a key
release <key>         release a key
effect <preset>       Chordify | Arpeggiator <order> | PitchShift <n> | Monophonic
remove                remove the effect and save it
load                  reload the saved effect
record                toggle MIDI recording
metronome             toggle the metronome (beats print as they fall)
pattern               print the recorded pattern
ports                 list serial ports
port <name>           open a serial port
output <mode>         midi | serial | both
quit";

pub(crate) fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match word.to_ascii_lowercase().as_str() {
        "scale" => {
            let (root, mode) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: scale <root> <mode>")?;
            Command::Scale { root: root.to_string(), mode: mode.trim().to_string() }
        }
        "scales" => Command::Scales,
        "show" => Command::Show,
        "left" => Command::ShiftLeft,
        "right" => Command::ShiftRight,
        "up" => Command::OctaveUp,
        "down" => Command::OctaveDown,
        "play" => Command::Play(rest.chars().filter(|c| !c.is_whitespace()).collect()),
        "hold" => Command::Hold(single_key(rest)?),
        "release" => Command::Release(single_key(rest)?),
        "effect" => Command::Effect(rest.parse().map_err(|e| format!("{e}"))?),
        "remove" => Command::RemoveEffect,
        "load" => Command::LoadEffect,
        "record" => Command::Record,
        "metronome" => Command::Metronome,
        "pattern" => Command::Pattern,
        "ports" => Command::Ports,
        "port" if !rest.is_empty() => Command::Port(rest.to_string()),
        "output" => Command::Output(match rest.to_ascii_lowercase().as_str() {
            "midi" | "midi_file" => OutputMode::MidiFile,
            "serial" => OutputMode::SerialOnly,
            "both" => OutputMode::Both,
            _ => return Err("usage: output midi|serial|both".to_string()),
        }),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(format!("unknown command {word:?}, try help")),
    };
    Ok(Some(command))
}

fn single_key(rest: &str) -> Result<char, String> {
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Ok(key),
        _ => Err("expected one key".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalekeys_core::ArpOrder;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("  ").unwrap(), None);
        assert_eq!(
            parse("scale F# Major").unwrap(),
            Some(Command::Scale { root: "F#".into(), mode: "Major".into() })
        );
        assert_eq!(parse("play z x c").unwrap(), Some(Command::Play("zxc".into())));
        assert_eq!(parse("hold q").unwrap(), Some(Command::Hold('q')));
        assert_eq!(
            parse("effect Arpeggiator Random").unwrap(),
            Some(Command::Effect(ActiveEffect::Arpeggiate { order: ArpOrder::Random }))
        );
        assert_eq!(parse("output serial").unwrap(), Some(Command::Output(OutputMode::SerialOnly)));
        assert_eq!(parse("QUIT").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("scale C").is_err());
        assert!(parse("hold zx").is_err());
        assert!(parse("effect Reverb").is_err());
        assert!(parse("output tape").is_err());
        assert!(parse("port").is_err());
        assert!(parse("dance").is_err());
    }
}
