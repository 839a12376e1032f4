use crate::core::io::traits::TrajectoryFile;
use crate::core::models::frame::{Cell, Frame};
use crate::core::models::trajectory::Trajectory;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Unexpected end of file: frame starting on line {line} declares {expected} atoms, found {found}")]
    Truncated {
        line: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("Invalid float for {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Atom line needs a symbol and three coordinates")]
    AtomLineTooShort,
    #[error("Comment line has no Lattice=\"...\" entry")]
    MissingLattice,
    #[error("Lattice entry must contain 9 numbers, found {0}")]
    InvalidLattice(usize),
    #[error("Unterminated quoted value")]
    UnterminatedQuote,
    #[error("No mass given for element '{0}' and no standard mass is known")]
    UnknownMass(String),
}

/// Extended XYZ: an atom count line, a `key=value` comment line carrying the cell and
/// energies, then one `symbol x y z [mass]` line per atom. Frames are concatenated.
pub struct XyzFile;

/// Standard atomic weights (u) for elements commonly simulated with pair potentials.
pub fn standard_atomic_mass(symbol: &str) -> Option<f64> {
    let mass = match symbol {
        "H" => 1.008,
        "He" => 4.002602,
        "Li" => 6.94,
        "C" => 12.011,
        "N" => 14.007,
        "O" => 15.999,
        "Ne" => 20.1797,
        "Na" => 22.98976928,
        "Mg" => 24.305,
        "Al" => 26.9815385,
        "Si" => 28.085,
        "Ar" => 39.948,
        "K" => 39.0983,
        "Ca" => 40.078,
        "Ti" => 47.867,
        "V" => 50.9415,
        "Cr" => 51.9961,
        "Fe" => 55.845,
        "Co" => 58.933194,
        "Ni" => 58.6934,
        "Cu" => 63.546,
        "Zn" => 65.38,
        "Kr" => 83.798,
        "Mo" => 95.95,
        "Pd" => 106.42,
        "Ag" => 107.8682,
        "Xe" => 131.293,
        "W" => 183.84,
        "Pt" => 195.084,
        "Au" => 196.966569,
        "Pb" => 207.2,
        _ => return None,
    };
    Some(mass)
}

fn parse_float(value: &str, field: &'static str, line: usize) -> Result<f64, XyzError> {
    value.parse().map_err(|_| XyzError::Parse {
        line,
        kind: XyzParseErrorKind::InvalidFloat {
            field,
            value: value.to_string(),
        },
    })
}

fn parse_comment(line: &str) -> Result<HashMap<String, String>, XyzParseErrorKind> {
    let mut entries = HashMap::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }

        let value = if chars.next_if_eq(&'=').is_some() {
            if chars.next_if_eq(&'"').is_some() {
                let mut quoted = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => quoted.push(c),
                        None => return Err(XyzParseErrorKind::UnterminatedQuote),
                    }
                }
                quoted
            } else {
                let mut bare = String::new();
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    bare.push(c);
                }
                bare
            }
        } else {
            "T".to_string()
        };

        entries.insert(key.to_ascii_lowercase(), value);
    }

    Ok(entries)
}

fn parse_lattice(value: &str, line: usize) -> Result<Cell, XyzError> {
    let numbers = value
        .split_whitespace()
        .map(|v| parse_float(v, "Lattice", line))
        .collect::<Result<Vec<_>, _>>()?;
    if numbers.len() != 9 {
        return Err(XyzError::Parse {
            line,
            kind: XyzParseErrorKind::InvalidLattice(numbers.len()),
        });
    }
    Ok(Cell::from_vectors(
        Vector3::new(numbers[0], numbers[1], numbers[2]),
        Vector3::new(numbers[3], numbers[4], numbers[5]),
        Vector3::new(numbers[6], numbers[7], numbers[8]),
    ))
}

fn next_line<I>(lines: &mut I) -> Result<Option<(usize, String)>, XyzError>
where
    I: Iterator<Item = (usize, io::Result<String>)>,
{
    match lines.next() {
        Some((idx, line)) => Ok(Some((idx + 1, line?))),
        None => Ok(None),
    }
}

impl TrajectoryFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Trajectory, Self::Error> {
        let mut trajectory = Trajectory::default();
        let mut lines = reader.lines().enumerate();

        loop {
            let Some((count_line_num, count_line)) = next_line(&mut lines)? else {
                break;
            };
            if count_line.trim().is_empty() {
                continue;
            }
            let atom_count: usize =
                count_line
                    .trim()
                    .parse()
                    .map_err(|_| XyzError::Parse {
                        line: count_line_num,
                        kind: XyzParseErrorKind::InvalidAtomCount(count_line.trim().to_string()),
                    })?;

            let Some((comment_line_num, comment)) = next_line(&mut lines)? else {
                return Err(XyzError::Truncated {
                    line: count_line_num,
                    expected: atom_count,
                    found: 0,
                });
            };
            let header = parse_comment(&comment).map_err(|kind| XyzError::Parse {
                line: comment_line_num,
                kind,
            })?;
            let cell = match header.get("lattice") {
                Some(value) => parse_lattice(value, comment_line_num)?,
                None => {
                    return Err(XyzError::Parse {
                        line: comment_line_num,
                        kind: XyzParseErrorKind::MissingLattice,
                    });
                }
            };
            let potential_energy = match header.get("energy").or(header.get("potential_energy")) {
                Some(v) => parse_float(v, "energy", comment_line_num)?,
                None => 0.0,
            };
            let kinetic_energy = match header.get("kinetic_energy") {
                Some(v) => parse_float(v, "kinetic_energy", comment_line_num)?,
                None => 0.0,
            };

            let mut symbols = Vec::with_capacity(atom_count);
            let mut positions = Vec::with_capacity(atom_count);
            let mut masses = Vec::with_capacity(atom_count);

            for found in 0..atom_count {
                let Some((line_num, line)) = next_line(&mut lines)? else {
                    return Err(XyzError::Truncated {
                        line: count_line_num,
                        expected: atom_count,
                        found,
                    });
                };
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < 4 {
                    return Err(XyzError::Parse {
                        line: line_num,
                        kind: XyzParseErrorKind::AtomLineTooShort,
                    });
                }
                let symbol = fields[0].to_string();
                let x = parse_float(fields[1], "x", line_num)?;
                let y = parse_float(fields[2], "y", line_num)?;
                let z = parse_float(fields[3], "z", line_num)?;
                let mass = match fields.get(4) {
                    Some(m) => parse_float(m, "mass", line_num)?,
                    None => standard_atomic_mass(&symbol).ok_or_else(|| XyzError::Parse {
                        line: line_num,
                        kind: XyzParseErrorKind::UnknownMass(symbol.clone()),
                    })?,
                };
                symbols.push(symbol);
                positions.push(Point3::new(x, y, z));
                masses.push(mass);
            }

            trajectory.push(Frame {
                symbols,
                positions,
                masses,
                cell,
                potential_energy,
                kinetic_energy,
            });
        }

        Ok(trajectory)
    }

    fn write_to(trajectory: &Trajectory, writer: &mut impl Write) -> Result<(), Self::Error> {
        for frame in trajectory.frames() {
            writeln!(writer, "{}", frame.atom_count())?;
            let lattice = frame
                .cell
                .vectors()
                .iter()
                .flat_map(|v| [v.x, v.y, v.z])
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(
                writer,
                "Lattice=\"{}\" Properties=species:S:1:pos:R:3:masses:R:1 energy={} kinetic_energy={} pbc=\"T T T\"",
                lattice, frame.potential_energy, frame.kinetic_energy
            )?;
            for ((symbol, pos), mass) in frame
                .symbols
                .iter()
                .zip(&frame.positions)
                .zip(&frame.masses)
            {
                writeln!(writer, "{} {} {} {} {}", symbol, pos.x, pos.y, pos.z, mass)?;
            }
        }
        Ok(())
    }
}
