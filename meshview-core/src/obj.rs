/// Line scanner for the OBJ-style model text format
///
/// Only `v` (position) and `f` (face) records are read. Every other line,
/// including comments and blank lines, is skipped.
use nalgebra::Point3;
use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, map, opt, recognize, rest},
    number::complete::float,
    sequence::{pair, preceded, terminated},
    IResult,
};

use crate::error::MeshError;

/// A polygon as read from the file, with 0-based raw vertex indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// 1-based source line, kept for diagnostics.
    pub line: usize,
    pub indices: Vec<u32>,
}

/// Positions and faces in file order, before welding and triangulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawModel {
    pub positions: Vec<Point3<f32>>,
    pub faces: Vec<Face>,
}

/// Face reference before range checking: (line, 1-based index as written).
struct PendingFace {
    line: usize,
    references: Vec<i64>,
}

/// Scan model text into raw positions and faces.
///
/// Face indices are range-checked against the final vertex count once the
/// whole text has been read.
pub fn scan(text: &str) -> Result<RawModel, MeshError> {
    let mut positions = Vec::new();
    let mut pending = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line_no = number + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => positions.push(parse_position(line_no, tokens)?),
            Some("f") => pending.push(parse_face(line_no, tokens)?),
            _ => {}
        }
    }

    let count = positions.len();
    let faces = pending
        .into_iter()
        .map(|face| -> Result<Face, MeshError> {
            let indices = face
                .references
                .iter()
                .map(|&index| {
                    if index < 1 || index > count as i64 {
                        Err(MeshError::Index {
                            line: face.line,
                            index,
                            count,
                        })
                    } else {
                        Ok((index - 1) as u32)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Face {
                line: face.line,
                indices,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawModel { positions, faces })
}

fn parse_position<'a>(
    line: usize,
    mut tokens: impl Iterator<Item = &'a str>,
) -> Result<Point3<f32>, MeshError> {
    let mut coords = [0.0f32; 3];
    for (axis, slot) in coords.iter_mut().enumerate() {
        let token = tokens.next().ok_or_else(|| {
            MeshError::parse(line, format!("vertex record needs 3 coordinates, found {axis}"))
        })?;
        let (_, value) = coordinate(token)
            .map_err(|_| MeshError::parse(line, format!("invalid coordinate `{token}`")))?;
        if !value.is_finite() {
            return Err(MeshError::parse(
                line,
                format!("coordinate `{token}` is not finite"),
            ));
        }
        *slot = value;
    }
    Ok(Point3::new(coords[0], coords[1], coords[2]))
}

fn parse_face<'a>(
    line: usize,
    tokens: impl Iterator<Item = &'a str>,
) -> Result<PendingFace, MeshError> {
    let references = tokens
        .map(|token| {
            face_reference(token)
                .map(|(_, index)| index)
                .map_err(|_| MeshError::parse(line, format!("invalid face reference `{token}`")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if references.len() < 3 {
        return Err(MeshError::parse(
            line,
            format!("face record needs at least 3 vertices, found {}", references.len()),
        ));
    }

    Ok(PendingFace { line, references })
}

/// A whole token as a decimal float, `.` as separator regardless of locale.
fn coordinate(token: &str) -> IResult<&str, f32> {
    all_consuming(float)(token)
}

/// `index[/texcoord[/normal]]`; only the position index is kept.
///
/// Integers beyond `i64` saturate so they fail the range check as an index
/// error rather than as malformed text.
fn face_reference(token: &str) -> IResult<&str, i64> {
    all_consuming(terminated(
        map(recognize(pair(opt(char('-')), digit1)), |digits: &str| {
            digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
                i64::MIN
            } else {
                i64::MAX
            })
        }),
        opt(preceded(char('/'), rest)),
    ))(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_positions_and_faces() {
        let model = scan("# triangle\nv 0 0 0\nv 1.5 0 0\nv 0 -2e1 .25\n\nf 1 2 3\n").unwrap();
        assert_eq!(model.positions.len(), 3);
        assert_eq!(model.positions[1], Point3::new(1.5, 0.0, 0.0));
        assert_eq!(model.positions[2], Point3::new(0.0, -20.0, 0.25));
        assert_eq!(
            model.faces,
            vec![Face {
                line: 6,
                indices: vec![0, 1, 2]
            }]
        );
    }

    #[test]
    fn test_secondary_attributes_are_dropped() {
        let model = scan("v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1/1/1 2//4 3/7 4\n").unwrap();
        assert_eq!(model.faces[0].indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_unknown_records_ignored() {
        let text = "mtllib a.mtl\no thing\nvn 0 0 1\nvt 0.5 0.5\nv 1 2 3 1.0\ns off\nusemtl x\n";
        let model = scan(text).unwrap();
        assert_eq!(model.positions, vec![Point3::new(1.0, 2.0, 3.0)]);
        assert!(model.faces.is_empty());
    }

    #[test]
    fn test_faces_may_precede_vertices() {
        let model = scan("f 1 2 3\nv 0 0 0\nv 1 0 0\nv 0 1 0\n").unwrap();
        assert_eq!(model.faces[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_short_vertex_record() {
        let err = scan("v 0 0 0\nv 1 2\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_bad_coordinate() {
        for text in ["v 1,5 0 0", "v 1.0x 0 0", "v nan 0 0", "v 0 inf 0"] {
            let err = scan(text).unwrap_err();
            assert!(matches!(err, MeshError::Parse { line: 1, .. }), "{text}: {err}");
        }
    }

    #[test]
    fn test_short_face_record() {
        let err = scan("v 0 0 0\nv 1 0 0\nf 1 2\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 3, .. }), "{err}");
    }

    #[test]
    fn test_bad_face_reference() {
        let err = scan("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 two 3\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 4, .. }), "{err}");
    }

    #[test]
    fn test_out_of_range_indices() {
        let err = scan("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n").unwrap_err();
        assert!(matches!(
            err,
            MeshError::Index {
                line: 4,
                index: 4,
                count: 3
            }
        ));

        let err = scan("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").unwrap_err();
        assert!(matches!(err, MeshError::Index { index: 0, .. }));

        let err = scan("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -1 -2 -3\n").unwrap_err();
        assert!(matches!(err, MeshError::Index { index: -1, .. }));
    }

    #[test]
    fn test_oversized_index_is_out_of_range() {
        let err = scan("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 99999999999999999999 1 2\n").unwrap_err();
        assert!(matches!(
            err,
            MeshError::Index {
                line: 4,
                index: i64::MAX,
                count: 3
            }
        ));

        let err = scan("v 0 0 0\nf 1 -99999999999999999999/2 1\n").unwrap_err();
        assert!(matches!(err, MeshError::Index { line: 2, index: i64::MIN, .. }));
    }
}
