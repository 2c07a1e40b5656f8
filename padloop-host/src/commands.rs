//! Line commands read from stdin, standing in for the pad and encoder driver.
//!
//! ```text
//! pad 3 [vel]   press pad 3          up 3        release pad 3
//! enc -2        turn the encoder     rec | play | clear
//! chord 5       record/delete slot   chord-stop  chord-kind 5
//! mode arp      play | arp | chord   arp down    set arp type
//! quit
//! ```

use padloop_core::device::{InputEvent, PlayMode};
use padloop_types::{ArpType, PadIndex, PAD_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Input(InputEvent),
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_string());
    };
    let arg = words.next();

    let event = match verb.to_lowercase().as_str() {
        "quit" | "q" | "exit" => return Ok(Command::Quit),
        "pad" | "p" => {
            let pad = parse_pad(arg)?;
            let velocity = match words.next() {
                Some(v) => v.parse::<u8>().map_err(|_| format!("bad velocity: {}", v))?.min(127),
                None => 0,
            };
            InputEvent::PadDown { pad, velocity }
        }
        "up" | "u" => InputEvent::PadUp {
            pad: parse_pad(arg)?,
        },
        "enc" | "e" => {
            let delta = match arg {
                Some(d) => d.parse::<i32>().map_err(|_| format!("bad encoder delta: {}", d))?,
                None => 1,
            };
            InputEvent::Encoder(delta)
        }
        "rec" => InputEvent::ToggleLoopRecord,
        "play" => InputEvent::ToggleLoopPlay,
        "clear" => InputEvent::ClearLoop,
        "chord" => InputEvent::ChordRecord(parse_pad(arg)?),
        "chord-stop" => InputEvent::StopChordRecording,
        "chord-kind" => InputEvent::ToggleChordKind(parse_pad(arg)?),
        "mode" => InputEvent::SetMode(parse_mode(arg)?),
        "arp" => {
            let token = arg.ok_or("arp needs a type")?;
            let arp_type = ArpType::from_token(token).ok_or_else(|| format!("unknown arp type: {}", token))?;
            InputEvent::SetArpType(arp_type)
        }
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(Command::Input(event))
}

fn parse_pad(arg: Option<&str>) -> Result<PadIndex, String> {
    let arg = arg.ok_or("missing pad number")?;
    let pad: usize = arg.parse().map_err(|_| format!("bad pad: {}", arg))?;
    if pad >= PAD_COUNT {
        return Err(format!("pad out of range: {}", pad));
    }
    Ok(pad as PadIndex)
}

fn parse_mode(arg: Option<&str>) -> Result<PlayMode, String> {
    match arg.map(str::to_lowercase).as_deref() {
        Some("play") => Ok(PlayMode::Play),
        Some("arp") => Ok(PlayMode::Arp),
        Some("chord") => Ok(PlayMode::Chord),
        Some(other) => Err(format!("unknown mode: {}", other)),
        None => Err("mode needs play, arp or chord".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pad_commands() {
        assert_eq!(
            parse_command("pad 3 90"),
            Ok(Command::Input(InputEvent::PadDown { pad: 3, velocity: 90 }))
        );
        assert_eq!(
            parse_command("p 0"),
            Ok(Command::Input(InputEvent::PadDown { pad: 0, velocity: 0 }))
        );
        assert_eq!(parse_command("up 15"), Ok(Command::Input(InputEvent::PadUp { pad: 15 })));
        assert!(parse_command("pad 16").is_err());
        assert!(parse_command("pad").is_err());
    }

    #[test]
    fn test_parse_encoder() {
        assert_eq!(parse_command("enc -2"), Ok(Command::Input(InputEvent::Encoder(-2))));
        assert_eq!(parse_command("e"), Ok(Command::Input(InputEvent::Encoder(1))));
        assert!(parse_command("enc lots").is_err());
    }

    #[test]
    fn test_parse_modes_and_arp() {
        assert_eq!(
            parse_command("mode ARP"),
            Ok(Command::Input(InputEvent::SetMode(PlayMode::Arp)))
        );
        assert_eq!(
            parse_command("arp rand-oct-dn"),
            Ok(Command::Input(InputEvent::SetArpType(ArpType::RandOctDown)))
        );
        assert!(parse_command("mode loud").is_err());
        assert!(parse_command("arp sideways").is_err());
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert_eq!(parse_command("  rec  "), Ok(Command::Input(InputEvent::ToggleLoopRecord)));
        assert_eq!(parse_command("chord 4"), Ok(Command::Input(InputEvent::ChordRecord(4))));
        assert!(parse_command("").is_err());
        assert!(parse_command("dance").is_err());
    }
}
