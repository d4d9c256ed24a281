//! Frame remapping for the looping expressions exporters emit
//! (`loopOut('cycle')`, `loopIn("pingpong", 2)`, ...).
//!
//! Arbitrary script is not evaluated; only the loop helpers are recognised.

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopType {
    Cycle,
    PingPong,
    Offset,
    Continue,
}

impl FromStr for LoopType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cycle" => Ok(LoopType::Cycle),
            "pingpong" => Ok(LoopType::PingPong),
            "offset" => Ok(LoopType::Offset),
            "continue" => Ok(LoopType::Continue),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopSide {
    /// `loopIn`: repeats before the first keyframe.
    In,
    /// `loopOut`: repeats after the last keyframe.
    Out,
}

/// A parsed `loopIn`/`loopOut` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopExpression {
    pub side: LoopSide,
    pub kind: LoopType,
    /// Number of keyframes taking part in the loop; 0 means all of them.
    pub keyframes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// Not a loop helper call.
    #[error("expression is not a loopIn/loopOut call")]
    Unrecognized,
    /// A loop helper with a type that changes values rather than time.
    #[error("loop type {0:?} offsets values and cannot be replayed by remapping time")]
    UnsupportedLoop(LoopType),
}

impl LoopExpression {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let (side, rest) = if let Some(idx) = source.find("loopOut(") {
            (LoopSide::Out, &source[idx + "loopOut(".len()..])
        } else if let Some(idx) = source.find("loopIn(") {
            (LoopSide::In, &source[idx + "loopIn(".len()..])
        } else {
            return Err(ExpressionError::Unrecognized);
        };

        let args = rest.split(')').next().unwrap_or("");
        let mut parts = args.split(',').map(str::trim);

        let kind = match parts.next() {
            Some(first) if !first.is_empty() => {
                let name = first.trim_matches(|c| c == '\'' || c == '"');
                // Exporters sometimes emit `type = 'cycle'`
                let name = name.rsplit('=').next().unwrap_or(name).trim();
                let name = name.trim_matches(|c| c == '\'' || c == '"');
                name.parse::<LoopType>()
                    .map_err(|_| ExpressionError::Unrecognized)?
            }
            _ => LoopType::Cycle,
        };

        let keyframes = parts
            .next()
            .and_then(|n| n.rsplit('=').next())
            .and_then(|n| n.trim().parse::<f32>().ok())
            .map(|n| n.max(0.0) as usize)
            .unwrap_or(0);

        match kind {
            LoopType::Cycle | LoopType::PingPong => Ok(LoopExpression {
                side,
                kind,
                keyframes,
            }),
            other => Err(ExpressionError::UnsupportedLoop(other)),
        }
    }

    /// Resolves the looped frame span against a property's keyframe times.
    pub fn bind(&self, times: &[f32]) -> Option<LoopRange> {
        let first = *times.first()?;
        let last = *times.last()?;
        let n = self.keyframes;
        let (begin, end) = match self.side {
            LoopSide::Out => {
                let begin = if n == 0 || n >= times.len() {
                    first
                } else {
                    times[times.len() - 1 - n]
                };
                (begin, last)
            }
            LoopSide::In => {
                let end = if n == 0 || n >= times.len() {
                    last
                } else {
                    times[n]
                };
                (first, end)
            }
        };
        if end - begin <= 0.0 {
            return None;
        }
        Some(LoopRange {
            side: self.side,
            kind: self.kind,
            begin,
            end,
        })
    }
}

/// A loop bound to concrete frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopRange {
    pub side: LoopSide,
    pub kind: LoopType,
    pub begin: f32,
    pub end: f32,
}

impl LoopRange {
    /// Maps `frame` into `[begin, end]`. Frames on the non-looping side pass through.
    pub fn remap(&self, frame: f32) -> f32 {
        let span = self.end - self.begin;
        match self.side {
            LoopSide::Out if frame > self.end => {
                let d = frame - self.end;
                let laps = (d / span).floor();
                let r = d - laps * span;
                match self.kind {
                    LoopType::PingPong if laps as i64 % 2 == 0 => self.end - r,
                    LoopType::PingPong => self.begin + r,
                    // Whole laps land on the end frame, not the begin frame.
                    _ if r == 0.0 => self.end,
                    _ => self.begin + r,
                }
            }
            LoopSide::In if frame < self.begin => {
                let d = self.begin - frame;
                let laps = (d / span).floor();
                let r = d - laps * span;
                match self.kind {
                    LoopType::PingPong if laps as i64 % 2 == 0 => self.begin + r,
                    LoopType::PingPong => self.end - r,
                    _ if r == 0.0 => self.begin,
                    _ => self.end - r,
                }
            }
            _ => frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        let e = LoopExpression::parse("loopOut('cycle')").unwrap();
        assert_eq!(e.side, LoopSide::Out);
        assert_eq!(e.kind, LoopType::Cycle);
        assert_eq!(e.keyframes, 0);

        let e = LoopExpression::parse("var $bm_rt;\n$bm_rt = loopIn(\"pingpong\", 2);").unwrap();
        assert_eq!(e.side, LoopSide::In);
        assert_eq!(e.kind, LoopType::PingPong);
        assert_eq!(e.keyframes, 2);

        let e = LoopExpression::parse("loopOut()").unwrap();
        assert_eq!(e.kind, LoopType::Cycle);

        let e = LoopExpression::parse("loopOut(type = 'pingpong', numKeyframes = 1)").unwrap();
        assert_eq!(e.kind, LoopType::PingPong);
        assert_eq!(e.keyframes, 1);
    }

    #[test]
    fn rejects_value_loops_and_other_script() {
        assert_eq!(
            LoopExpression::parse("loopOut('offset')"),
            Err(ExpressionError::UnsupportedLoop(LoopType::Offset))
        );
        assert_eq!(
            LoopExpression::parse("wiggle(2, 10)"),
            Err(ExpressionError::Unrecognized)
        );
    }

    #[test]
    fn errors_describe_themselves() {
        let err = LoopExpression::parse("loopIn('continue')").unwrap_err();
        assert_eq!(
            err.to_string(),
            "loop type Continue offsets values and cannot be replayed by remapping time"
        );
        let err: Box<dyn std::error::Error> = Box::new(ExpressionError::Unrecognized);
        assert_eq!(err.to_string(), "expression is not a loopIn/loopOut call");
    }

    #[test]
    fn bind_uses_keyframe_count() {
        let e = LoopExpression::parse("loopOut('cycle', 1)").unwrap();
        let range = e.bind(&[0.0, 10.0, 30.0]).unwrap();
        assert_eq!((range.begin, range.end), (10.0, 30.0));
        assert!(e.bind(&[5.0]).is_none());
    }

    #[test]
    fn cycle_out_lands_whole_laps_on_end() {
        let range = LoopExpression::parse("loopOut('cycle')")
            .unwrap()
            .bind(&[0.0, 20.0])
            .unwrap();
        assert_eq!(range.remap(10.0), 10.0);
        assert_eq!(range.remap(25.0), 5.0);
        for k in 0..4 {
            assert_eq!(range.remap(20.0 + 20.0 * k as f32), 20.0);
        }
    }

    #[test]
    fn pingpong_out_reflects() {
        let range = LoopExpression::parse("loopOut('pingpong')")
            .unwrap()
            .bind(&[0.0, 20.0])
            .unwrap();
        for d in [0.0, 3.0, 12.5, 20.0] {
            assert_eq!(range.remap(20.0 + d), 20.0 - d);
        }
        assert_eq!(range.remap(45.0), 5.0);
    }

    #[test]
    fn loop_in_mirrors_loop_out() {
        let cycle = LoopExpression::parse("loopIn('cycle')")
            .unwrap()
            .bind(&[10.0, 30.0])
            .unwrap();
        assert_eq!(cycle.remap(5.0), 25.0);
        assert_eq!(cycle.remap(-10.0), 10.0);

        let pingpong = LoopExpression::parse("loopIn('pingpong')")
            .unwrap()
            .bind(&[10.0, 30.0])
            .unwrap();
        assert_eq!(pingpong.remap(5.0), 15.0);
        assert_eq!(pingpong.remap(-15.0), 25.0);
    }
}
