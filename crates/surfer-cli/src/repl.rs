//! REPL – Read-Eval-Print Loop for the Surfer operator console.
//!
//! Supported slash-commands:
//!   /help               – show this list
//!   /topics             – list channels known to the bridge
//!   /imu                – latest acceleration, angular velocity, orientation
//!   /attitude           – roll / pitch / yaw from the latest quaternion
//!   /status             – latest mode, arming and behaviour
//!   /detections         – drain and print buffered detections
//!   /vel u v r          – normalised velocity setpoint
//!   /force fx fy mz     – normalised force setpoint
//!   /motor m1 m2 m3 m4  – per-motor setpoints
//!   /stop               – zero velocity
//!   /reset-imu          – zero the inertial reference
//!   /quit | /exit       – disconnect and exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use surfer_client::{COMMAND_LIMIT, SurferSession};
use tokio::runtime::Runtime;

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Topics,
    Imu,
    Attitude,
    Status,
    Detections,
    Velocity(f64, f64, f64),
    Force(f64, f64, f64),
    Motor([f64; 4]),
    Stop,
    ResetImu,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".to_string());
        };
        let args: Vec<&str> = words.collect();

        let cmd = match verb {
            "/help" => Command::Help,
            "/topics" => Command::Topics,
            "/imu" => Command::Imu,
            "/attitude" => Command::Attitude,
            "/status" => Command::Status,
            "/detections" => Command::Detections,
            "/vel" => {
                let [u, v, r] = numbers::<3>(verb, &args)?;
                Command::Velocity(u, v, r)
            }
            "/force" => {
                let [x, y, n] = numbers::<3>(verb, &args)?;
                Command::Force(x, y, n)
            }
            "/motor" => Command::Motor(numbers::<4>(verb, &args)?),
            "/stop" => Command::Stop,
            "/reset-imu" => Command::ResetImu,
            "/quit" | "/exit" => Command::Quit,
            other => return Err(format!("unknown command '{other}'")),
        };

        let takes_args = matches!(cmd, Command::Velocity(..) | Command::Force(..) | Command::Motor(_));
        if !takes_args && !args.is_empty() {
            return Err(format!("{verb} takes no arguments"));
        }
        Ok(cmd)
    }
}

fn parse_all(args: &[&str]) -> Result<Vec<f64>, String> {
    args.iter()
        .map(|a| match a.parse::<f64>() {
            Ok(v) if !v.is_nan() => Ok(v),
            _ => Err(format!("'{a}' is not a number")),
        })
        .collect()
}

fn numbers<const N: usize>(verb: &str, args: &[&str]) -> Result<[f64; N], String> {
    if args.len() != N {
        return Err(format!("{verb} expects {N} values, got {}", args.len()));
    }
    let values = parse_all(args)?;
    values
        .try_into()
        .map_err(|_| format!("{verb} expects {N} values"))
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(session: &SurferSession, runtime: &Runtime, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let prompt = format!("{}>", session.config().name);

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", prompt.bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match Command::parse(line) {
            Ok(Command::Quit) => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Ok(cmd) => execute(session, runtime, cmd),
            Err(e) => println!(
                "{} {}. Type {} for available commands.",
                "Error:".red(),
                e.yellow(),
                "/help".bold()
            ),
        }
    }
}

fn execute(session: &SurferSession, runtime: &Runtime, cmd: Command) {
    if !session.is_connected() && !matches!(cmd, Command::Help) {
        println!("{}", "  ⚠  Not connected to rosbridge.".yellow());
    }

    match cmd {
        Command::Help => cmd_help(),
        Command::Topics => {
            let topics = runtime.block_on(session.list_channels());
            if topics.is_empty() {
                println!("  {}", "No topics reported.".dimmed());
            }
            for topic in topics {
                println!("  • {}", topic);
            }
        }
        Command::Imu => {
            let s = session.snapshot();
            println!("  {} {}", "acceleration    :".bold(), fmt_vec(&s.acceleration));
            println!("  {} {}", "angular velocity:".bold(), fmt_vec(&s.angular_velocity));
            println!("  {} {}", "orientation xyz :".bold(), fmt_vec(&s.euler_angles));
            println!("  {} {}", "quaternion xyzw :".bold(), fmt_vec(&s.quaternion));
        }
        Command::Attitude => match session.attitude() {
            Ok(a) => println!(
                "  roll {:+.2}°  pitch {:+.2}°  yaw {:+.2}°",
                a.roll.to_degrees(),
                a.pitch.to_degrees(),
                a.yaw.to_degrees()
            ),
            Err(e) => println!("  {} {}", "No attitude yet:".yellow(), e),
        },
        Command::Status => {
            let st = session.status();
            let armed = if st.armed { "ARMED".red().bold() } else { "disarmed".green() };
            println!("  {} {}  {}", "mode:".bold(), st.mode.cyan(), armed);
            if let Some(group) = st.group {
                println!("  {} {}", "group:".bold(), group);
            }
            if let Some(behavior) = st.behavior {
                println!("  {} {}", "behavior:".bold(), behavior);
            }
            if let Some(id) = st.id {
                println!("  {} {}", "id:".bold(), id);
            }
        }
        Command::Detections => {
            let detections = session.drain_detections();
            if detections.is_empty() {
                println!("  {}", "No new detections.".dimmed());
            }
            for d in detections {
                println!(
                    "  • {} {:.0}%  bbox ({:.1}, {:.1}, {:.1}×{:.1})  at ({:.2}, {:.2}, {:.2})",
                    d.class_id.bold(),
                    d.confidence * 100.0,
                    d.bbox.x,
                    d.bbox.y,
                    d.bbox.w,
                    d.bbox.h,
                    d.position.0,
                    d.position.1,
                    d.position.2
                );
            }
        }
        Command::Velocity(u, v, r) => {
            warn_if_clamped(&[u, v, r]);
            session.set_velocity_command(u, v, r);
        }
        Command::Force(x, y, n) => {
            warn_if_clamped(&[x, y, n]);
            session.set_force_command(x, y, n);
        }
        Command::Motor([m1, m2, m3, m4]) => {
            warn_if_clamped(&[m1, m2, m3, m4]);
            session.set_motor_command(m1, m2, m3, m4);
        }
        Command::Stop => {
            session.stop();
            println!("  {}", "✓ Stop sent.".green());
        }
        Command::ResetImu => {
            if runtime.block_on(session.reset_imu()) {
                println!("  {}", "✓ IMU reset.".green());
            } else {
                println!("  {}", "✗ IMU reset failed.".red());
            }
        }
        Command::Quit => {}
    }
}

fn cmd_help() {
    println!();
    println!("{}", "Surfer Commands".bold().underline());
    println!("  {}          – channels known to the bridge", "/topics".bold().cyan());
    println!("  {}             – latest inertial data", "/imu".bold().cyan());
    println!("  {}        – roll / pitch / yaw", "/attitude".bold().cyan());
    println!("  {}          – mode and arming", "/status".bold().cyan());
    println!("  {}      – drain buffered detections", "/detections".bold().cyan());
    println!("  {}       – velocity setpoint", "/vel u v r".bold().cyan());
    println!("  {} – force setpoint", "/force fx fy mz".bold().cyan());
    println!("  {}  – per-motor setpoints", "/motor m1 m2 m3 m4".bold().cyan());
    println!("  {}            – zero velocity", "/stop".bold().cyan());
    println!("  {}       – zero the inertial reference", "/reset-imu".bold().cyan());
    println!("  {}     – exit the console", "/quit  /exit".bold().cyan());
    println!();
}

fn warn_if_clamped(values: &[f64]) {
    if values.iter().any(|v| v.abs() > COMMAND_LIMIT) {
        println!(
            "  {}",
            format!("⚠  Values outside ±{COMMAND_LIMIT} are clamped.").yellow()
        );
    }
}

fn fmt_vec(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:+.3}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_argument_free_commands() {
        assert_eq!(Command::parse("/help"), Ok(Command::Help));
        assert_eq!(Command::parse("  /reset-imu "), Ok(Command::ResetImu));
        assert_eq!(Command::parse("/exit"), Ok(Command::Quit));
        assert_eq!(Command::parse("/quit"), Ok(Command::Quit));
    }

    #[test]
    fn parses_numeric_setpoints() {
        assert_eq!(
            Command::parse("/vel 0.5 -0.25 1e-1"),
            Ok(Command::Velocity(0.5, -0.25, 0.1))
        );
        assert_eq!(Command::parse("/force 2 0 -3"), Ok(Command::Force(2.0, 0.0, -3.0)));
        assert_eq!(
            Command::parse("/motor 0.1 0.2 0.3 0.4"),
            Ok(Command::Motor([0.1, 0.2, 0.3, 0.4]))
        );
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(Command::parse("/vel 1 2").is_err());
        assert!(Command::parse("/force 1 2 3 4").is_err());
        assert!(Command::parse("/motor").is_err());
        assert!(Command::parse("/motor 0.1 0.2 0.3").is_err());
        assert!(Command::parse("/stop now").is_err());
    }

    #[test]
    fn rejects_non_numeric_values() {
        let err = Command::parse("/vel 1 fast 0").unwrap_err();
        assert!(err.contains("fast"));
    }

    #[test]
    fn rejects_nan_setpoints() {
        assert!(Command::parse("/vel NaN 0 0").is_err());
        assert!(Command::parse("/motor 0 nan 0 0").is_err());
        assert_eq!(
            Command::parse("/force inf 0 0"),
            Ok(Command::Force(f64::INFINITY, 0.0, 0.0))
        );
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(Command::parse("/settings").is_err());
        assert!(Command::parse("help").is_err());
    }

    #[test]
    fn fmt_vec_signs_every_component() {
        assert_eq!(fmt_vec(&[1.0, -0.5]), "[+1.000, -0.500]");
    }
}
