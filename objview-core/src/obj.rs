/// Wavefront OBJ parser producing [`Geometry`]
///
/// Only the records needed to draw a mesh are read: `v`, `vn`, `vt` and `f`.
/// Everything else (comments, groups, materials, smoothing) is skipped.
use std::future::Future;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, opt, recognize},
    number::complete::recognize_float,
    sequence::{pair, preceded, tuple},
    IResult,
};
use tracing::{debug, trace};

use crate::error::{AttributeKind, ObjError, RecordKind};
use crate::geometry::{Face, Geometry, Vector2, Vector3, Vertex};

/// Parse OBJ source text into a triangle mesh.
///
/// Faces with more than three corners are fan-triangulated. Any face that
/// references a missing attribute fails the whole parse.
pub fn parse(src: &str) -> Result<Geometry, ObjError> {
    let mut state = ParseState::default();
    for (number, line) in src.lines().enumerate() {
        state.line(number + 1, line)?;
    }

    debug!(
        positions = state.positions.len(),
        normals = state.normals.len(),
        uvs = state.uvs.len(),
        faces = state.faces.len(),
        "Parsed OBJ"
    );

    Ok(Geometry::new(state.faces))
}

/// Await the raw mesh text from `fetch`, then parse it.
///
/// The future is polled to completion exactly once; there is no timeout, so a
/// fetch that never resolves leaves this future pending forever.
pub async fn load_obj<F>(fetch: F) -> Result<Geometry, ObjError>
where
    F: Future<Output = String>,
{
    let src = fetch.await;
    parse(&src)
}

#[derive(Default)]
struct ParseState {
    positions: Vec<Vector3>,
    normals: Vec<Vector3>,
    uvs: Vec<Vector2>,
    faces: Vec<Face>,
}

/// Indices of one face corner as written in the file (1-based, may be negative)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Corner {
    position: i64,
    uv: Option<i64>,
    normal: Option<i64>,
}

impl ParseState {
    fn line(&mut self, number: usize, line: &str) -> Result<(), ObjError> {
        let line = match line.find('#') {
            Some(start) => &line[..start],
            None => line,
        };
        let line = line.trim();
        let (keyword, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));

        match keyword {
            "v" => {
                if let Some([x, y, z]) = parse_numbers(number, rest) {
                    let position = finite3(number, RecordKind::Position, x, y, z)?;
                    self.positions.push(position);
                    return Ok(());
                }
            }
            "vn" => {
                if let Some([x, y, z]) = parse_numbers(number, rest) {
                    let normal = finite3(number, RecordKind::Normal, x, y, z)?;
                    self.normals.push(normal);
                    return Ok(());
                }
            }
            "vt" => {
                if let Some([u, v]) = parse_numbers(number, rest) {
                    if !(u.is_finite() && v.is_finite()) {
                        return Err(ObjError::NonFiniteValue {
                            line: number,
                            record: RecordKind::Uv,
                        });
                    }
                    // Texture origin is top-left on the GPU side
                    self.uvs.push(Vector2::new(u, 1.0 - v));
                    return Ok(());
                }
            }
            "f" => return self.face(number, rest),
            _ => {}
        }

        if !line.is_empty() {
            trace!(line = number, "Skipping OBJ line `{}`", line);
        }
        Ok(())
    }

    fn face(&mut self, number: usize, rest: &str) -> Result<(), ObjError> {
        let corners = rest
            .split_whitespace()
            .map(|token| {
                parse_corner(token)
                    .map(|(_, corner)| corner)
                    .map_err(|_| ObjError::InvalidCorner {
                        line: number,
                        token: token.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if corners.len() < 3 {
            return Err(ObjError::IncompleteFace {
                line: number,
                corners: corners.len(),
            });
        }

        let vertices = corners
            .iter()
            .map(|corner| self.vertex(number, corner))
            .collect::<Result<Vec<_>, _>>()?;

        // Fan triangulation around the first corner
        for edge in vertices[1..].windows(2) {
            self.faces.push(Face::new(vertices[0], edge[0], edge[1]));
        }
        Ok(())
    }

    fn vertex(&self, line: usize, corner: &Corner) -> Result<Vertex, ObjError> {
        let position = resolve(&self.positions, corner.position, AttributeKind::Position, line)?;
        let uv = match corner.uv {
            Some(index) => resolve(&self.uvs, index, AttributeKind::Uv, line)?,
            None => Vector2::zeros(),
        };
        let normal = match corner.normal {
            Some(index) => resolve(&self.normals, index, AttributeKind::Normal, line)?,
            None => Vector3::zeros(),
        };
        Ok(Vertex::new(position, normal, uv))
    }
}

/// Resolve an OBJ index against the attributes accumulated so far.
///
/// `i > 0` is the i-th element, `-k` is the k-th element from the end.
fn resolve<T: Copy>(
    items: &[T],
    index: i64,
    kind: AttributeKind,
    line: usize,
) -> Result<T, ObjError> {
    let offset = if index > 0 {
        usize::try_from(index - 1).ok()
    } else {
        usize::try_from(index.unsigned_abs())
            .ok()
            .filter(|_| index != 0)
            .and_then(|k| items.len().checked_sub(k))
    };

    offset
        .and_then(|offset| items.get(offset).copied())
        .ok_or(ObjError::MalformedRecord {
            line,
            kind,
            index,
            available: items.len(),
        })
}

fn finite3(line: usize, record: RecordKind, x: f64, y: f64, z: f64) -> Result<Vector3, ObjError> {
    if x.is_finite() && y.is_finite() && z.is_finite() {
        Ok(Vector3::new(x, y, z))
    } else {
        Err(ObjError::NonFiniteValue { line, record })
    }
}

fn parse_number(input: &str) -> IResult<&str, f64> {
    map_res(recognize_float, str::parse::<f64>)(input)
}

/// The leading number of each of the first `N` whitespace-separated tokens.
///
/// A token only needs to start with a number: `1.5.0` reads as `1.5`. Fewer
/// than `N` tokens, or a token with no numeric prefix, gives `None`.
fn parse_numbers<const N: usize>(line: usize, rest: &str) -> Option<[f64; N]> {
    let mut tokens = rest.split_whitespace();
    let mut values = [0.0; N];
    for value in &mut values {
        let token = tokens.next()?;
        let (tail, number) = parse_number(token).ok()?;
        if !tail.is_empty() {
            trace!(line, "Ignoring `{}` after number in `{}`", tail, token);
        }
        *value = number;
    }
    Some(values)
}

fn parse_index(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>)(input)
}

/// `v/vt/vn`, `v//vn`, `v/vt` or `v`
fn parse_corner(input: &str) -> IResult<&str, Corner> {
    let full = map(
        tuple((
            parse_index,
            preceded(char('/'), parse_index),
            preceded(char('/'), parse_index),
        )),
        |(position, uv, normal)| Corner {
            position,
            uv: Some(uv),
            normal: Some(normal),
        },
    );
    let position_normal = map(
        pair(parse_index, preceded(tag("//"), parse_index)),
        |(position, normal)| Corner {
            position,
            uv: None,
            normal: Some(normal),
        },
    );
    let position_uv = map(
        pair(parse_index, preceded(char('/'), parse_index)),
        |(position, uv)| Corner {
            position,
            uv: Some(uv),
            normal: None,
        },
    );
    let position_only = map(parse_index, |position| Corner {
        position,
        uv: None,
        normal: None,
    });

    all_consuming(alt((full, position_normal, position_uv, position_only)))(input)
}
