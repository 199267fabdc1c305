use std::path::{Path, PathBuf};

use bevy::math::Vec2;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use track_curve::mapping::map_uniform;
use track_curve::offset::rail_ties;
use track_curve::{
    ArcLengthTable, BoostPanels, ControlPoints, GlobalPosition, TrackEditor, TrackFile,
    TrackFollower, TrackParameter, build_rails, map_with_table,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Track file to read; the built-in loop when not given.
    #[arg(long, global = true, env = "TRACK_TOOL_TRACK")]
    track: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write the built-in track to a file.
    Init { path: PathBuf },
    /// Segment and total arc lengths.
    Info {
        #[arg(long)]
        steps: Option<usize>,
    },
    /// Position and heading for a slider value or a distance.
    Locate {
        value: f32,
        /// Treat VALUE as a distance along the track.
        #[arg(long, conflicts_with = "uniform")]
        distance: bool,
        /// Skip arc-length correction.
        #[arg(long)]
        uniform: bool,
        #[arg(long)]
        steps: Option<usize>,
    },
    /// Left and right rail control points.
    Rails {
        #[arg(long)]
        steps: Option<usize>,
        #[arg(long)]
        gauge: Option<f32>,
    },
    /// Cross ties along the track.
    Ties {
        #[arg(long)]
        spacing: Option<f32>,
        #[arg(long)]
        width: Option<f32>,
    },
    /// Drive a follower round the loop and print its poses.
    Simulate {
        #[arg(long, default_value_t = 5.0)]
        seconds: f32,
        #[arg(long, default_value_t = 16.0)]
        dt_ms: f32,
        /// World units per second.
        #[arg(long, default_value_t = 100.0)]
        speed: f32,
        /// Boost panel distances as FIRST:LAST.
        #[arg(long, value_parser = parse_boost)]
        boost: Option<(f32, f32)>,
        #[arg(long, default_value_t = 10.0)]
        trigger_radius: f32,
    },
    /// Edit control points and write the result.
    Edit {
        #[command(subcommand)]
        action: EditAction,
        /// Where to write the edited track.
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum EditAction {
    /// Scale about the centroid.
    Scale { factor: f32 },
    /// Insert a point into the nearest edge.
    Insert { x: f32, y: f32 },
    /// Move the point at INDEX.
    Move { index: usize, x: f32, y: f32 },
    /// Delete the point at INDEX.
    Delete { index: usize },
}

fn parse_boost(s: &str) -> Result<(f32, f32), String> {
    let (first, last) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FIRST:LAST, got {s:?}"))?;
    let first = first.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let last = last.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok((first, last))
}

const MAX_FRAMES: f32 = 1_000_000.0;

fn frame_count(seconds: f32, dt_ms: f32) -> Result<usize, String> {
    if !(dt_ms > 0.0 && dt_ms.is_finite()) {
        return Err(format!("--dt-ms must be positive, got {dt_ms}"));
    }
    if !(seconds >= 0.0 && seconds.is_finite()) {
        return Err(format!("--seconds must be a non-negative number, got {seconds}"));
    }
    let frames = (seconds * 1000.0 / dt_ms).ceil();
    if frames > MAX_FRAMES {
        return Err(format!(
            "{frames} frames requested, at most {MAX_FRAMES} allowed; raise --dt-ms or lower --seconds"
        ));
    }
    Ok(frames as usize)
}

fn xy(v: Vec2) -> [f32; 2] {
    [v.x, v.y]
}

#[derive(Serialize)]
struct InfoReport<'a> {
    name: &'a str,
    points: usize,
    steps: usize,
    lengths: &'a [f32],
    cumulative: &'a [f32],
    total: f32,
}

#[derive(Serialize)]
struct LocateReport {
    segment_index: usize,
    u: f32,
    point: [f32; 2],
    tangent: [f32; 2],
    heading: f32,
}

impl From<GlobalPosition> for LocateReport {
    fn from(pos: GlobalPosition) -> Self {
        Self {
            segment_index: pos.segment_index,
            u: pos.u,
            point: xy(pos.point),
            tangent: xy(pos.tangent),
            heading: pos.heading(),
        }
    }
}

#[derive(Serialize)]
struct RailsReport {
    gauge: f32,
    left: Vec<[f32; 2]>,
    right: Vec<[f32; 2]>,
}

#[derive(Serialize)]
struct TieReport {
    center: [f32; 2],
    start: [f32; 2],
    end: [f32; 2],
}

#[derive(Serialize)]
struct FrameReport {
    time_ms: f32,
    distance: f32,
    position: [f32; 2],
    heading: f32,
    speed: f32,
    boosted: bool,
}

fn load_track(path: Option<&Path>) -> Result<TrackFile, Box<dyn std::error::Error>> {
    let track = match path {
        Some(path) => TrackFile::load(path)?,
        None => TrackFile::load_builtin()?,
    };
    info!(name = %track.metadata.name, points = track.control_points.len(), "loaded track");
    Ok(track)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "track_tool=info,track_curve=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Init { path } = &cli.command {
        TrackFile::load_builtin()?.save(path)?;
        info!(path = %path.display(), "wrote track");
        return Ok(());
    }

    let track = load_track(cli.track.as_deref())?;
    let meta = track.metadata.clone();
    let points: ControlPoints = track.control_points()?;

    match cli.command {
        Commands::Init { .. } => {}
        Commands::Info { steps } => {
            let table = ArcLengthTable::build(&points, steps.unwrap_or(meta.position_steps));
            print_json(&InfoReport {
                name: &meta.name,
                points: points.len(),
                steps: table.steps(),
                lengths: table.lengths(),
                cumulative: table.cumulative(),
                total: table.total(),
            })?;
        }
        Commands::Locate {
            value,
            distance,
            uniform,
            steps,
        } => {
            let pos = if uniform {
                map_uniform(&points, value)
            } else {
                let table = ArcLengthTable::build(&points, steps.unwrap_or(meta.position_steps));
                let param = if distance {
                    TrackParameter::Distance(value)
                } else {
                    TrackParameter::Slider(value)
                };
                map_with_table(&points, &table, param)
            };
            print_json(&LocateReport::from(pos))?;
        }
        Commands::Rails { steps, gauge } => {
            let gauge = gauge.unwrap_or(meta.rail_gauge);
            let rails = build_rails(&points, steps.unwrap_or(meta.rail_steps), gauge)?;
            print_json(&RailsReport {
                gauge,
                left: rails.left.to_arrays(),
                right: rails.right.to_arrays(),
            })?;
        }
        Commands::Ties { spacing, width } => {
            let table = ArcLengthTable::build(&points, meta.rail_steps);
            let ties: Vec<TieReport> = rail_ties(
                &points,
                &table,
                spacing.unwrap_or(meta.tie_spacing),
                width.unwrap_or(meta.tie_width),
            )
            .into_iter()
            .map(|tie| TieReport {
                center: xy(tie.center),
                start: xy(tie.start),
                end: xy(tie.end),
            })
            .collect();
            info!(count = ties.len(), "laid ties");
            print_json(&ties)?;
        }
        Commands::Simulate {
            seconds,
            dt_ms,
            speed,
            boost,
            trigger_radius,
        } => {
            let frames = frame_count(seconds, dt_ms)?;
            let table = ArcLengthTable::build(&points, meta.position_steps);
            let mut follower = TrackFollower::new(speed);
            if let Some((first, last)) = boost {
                follower = follower.with_panels(BoostPanels {
                    first,
                    last,
                    trigger_radius,
                });
            }

            let mut report = Vec::with_capacity(frames);
            for frame in 1..=frames {
                let pose = follower.step(&points, &table, dt_ms);
                report.push(FrameReport {
                    time_ms: frame as f32 * dt_ms,
                    distance: pose.distance,
                    position: xy(pose.position),
                    heading: pose.heading,
                    speed: follower.speed(),
                    boosted: follower.is_boosted(),
                });
            }
            print_json(&report)?;
        }
        Commands::Edit { action, output } => {
            let mut editor = TrackEditor::new(track)?;
            match action {
                EditAction::Scale { factor } => editor.scale(factor),
                EditAction::Insert { x, y } => {
                    editor.insert_point(Vec2::new(x, y))?;
                }
                EditAction::Move { index, x, y } => editor.move_point(index, Vec2::new(x, y))?,
                EditAction::Delete { index } => {
                    editor.select(index)?;
                    editor.delete_selected()?;
                }
            }
            editor.track_file().save(&output)?;
            editor.mark_saved();
            info!(
                path = %output.display(),
                points = editor.points().len(),
                "wrote edited track"
            );
        }
    }

    Ok(())
}
