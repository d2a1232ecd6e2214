//! Pulls a hinge angle out of whatever text the sensor query prints.
//!
//! The accessibility query returns the label of another application's window,
//! so the format is loose: `"97"`, `"97.5°"`, `"Angle: 97.5 degrees"`. The
//! first run of digits, optionally followed by a dot and more digits, wins.

use nom::{
    character::complete::{anychar, char, digit1},
    combinator::{map_res, opt, recognize},
    multi::many_till,
    sequence::pair,
    Finish, IResult,
};

fn parse_decimal(s: &str) -> IResult<&str, f32> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |digits: &str| digits.parse::<f32>(),
    )(s)
}

/// Skips characters until a decimal number starts, then parses it.
pub fn first_decimal(s: &str) -> IResult<&str, f32> {
    let (rest, (_skipped, value)) = many_till(anychar, parse_decimal)(s)?;
    Ok((rest, value))
}

/// Returns the first decimal number found in `s`, or `None` if there is none.
pub fn parse_angle(s: &str) -> Option<f32> {
    first_decimal(s.trim()).finish().ok().map(|(_, v)| v)
}
