//! Dice expressions such as `2d6+1`, `d20` or a bare `3`

use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{all_consuming, map, map_res, opt};
use nom::branch::alt;
use nom::{IResult, Parser};
use rand::Rng;

use crate::core::error::{Result, SpawnError};

pub const MAX_DICE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpr {
    /// Zero for a bare constant
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpr {
    pub fn parse(source: &str) -> Result<Self> {
        let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(SpawnError::Dice("empty dice expression".into()));
        }

        let expr = match all_consuming(alt((dice, constant))).parse(compact.as_str()) {
            Ok((_, expr)) => expr,
            Err(e) => return Err(SpawnError::Dice(format!("cannot parse '{}': {}", source, e))),
        };

        if expr.count > 0 || expr.sides > 0 {
            if expr.count == 0 || expr.count > MAX_DICE {
                return Err(SpawnError::Dice(format!(
                    "'{}' must roll between 1 and {} dice",
                    source, MAX_DICE
                )));
            }
            if expr.sides == 0 {
                return Err(SpawnError::Dice(format!("'{}' has zero-sided dice", source)));
            }
        }
        Ok(expr)
    }

    pub fn is_constant(&self) -> bool {
        self.count == 0
    }

    /// Roll the expression; results below zero clamp to zero
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let mut total: i64 = self.modifier as i64;
        for _ in 0..self.count {
            total += rng.gen_range(1..=self.sides) as i64;
        }
        total.clamp(0, u32::MAX as i64) as u32
    }

    pub fn min_value(&self) -> u32 {
        (self.count as i64 + self.modifier as i64).clamp(0, u32::MAX as i64) as u32
    }

    pub fn max_value(&self) -> u32 {
        let total = self.count as i64 * self.sides as i64 + self.modifier as i64;
        total.clamp(0, u32::MAX as i64) as u32
    }
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>()).parse(input)
}

fn modifier(input: &str) -> IResult<&str, i32> {
    map((one_of("+-"), number), |(sign, value)| {
        let value = value.min(i32::MAX as u32) as i32;
        if sign == '-' {
            -value
        } else {
            value
        }
    })
    .parse(input)
}

fn dice(input: &str) -> IResult<&str, DiceExpr> {
    map(
        (opt(number), one_of("dD"), number, opt(modifier)),
        |(count, _, sides, modifier)| DiceExpr {
            count: count.unwrap_or(1),
            sides,
            modifier: modifier.unwrap_or(0),
        },
    )
    .parse(input)
}

fn constant(input: &str) -> IResult<&str, DiceExpr> {
    map((opt(char('-')), number), |(negative, value)| {
        let value = value.min(i32::MAX as u32) as i32;
        DiceExpr {
            count: 0,
            sides: 0,
            modifier: if negative.is_some() { -value } else { value },
        }
    })
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            DiceExpr::parse("2d6+1").unwrap(),
            DiceExpr { count: 2, sides: 6, modifier: 1 }
        );
        assert_eq!(
            DiceExpr::parse("d20").unwrap(),
            DiceExpr { count: 1, sides: 20, modifier: 0 }
        );
        assert_eq!(
            DiceExpr::parse(" 3D4 - 2 ").unwrap(),
            DiceExpr { count: 3, sides: 4, modifier: -2 }
        );
        assert!(DiceExpr::parse("5").unwrap().is_constant());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DiceExpr::parse("").is_err());
        assert!(DiceExpr::parse("2d").is_err());
        assert!(DiceExpr::parse("2d6+").is_err());
        assert!(DiceExpr::parse("two dice").is_err());
        assert!(DiceExpr::parse("0d6").is_err());
        assert!(DiceExpr::parse("2d0").is_err());
        assert!(DiceExpr::parse("101d6").is_err());
    }

    #[test]
    fn test_roll_stays_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let expr = DiceExpr::parse("2d6+1").unwrap();
        for _ in 0..200 {
            let value = expr.roll(&mut rng);
            assert!(value >= expr.min_value() && value <= expr.max_value());
        }
        assert_eq!(expr.min_value(), 3);
        assert_eq!(expr.max_value(), 13);
    }

    #[test]
    fn test_negative_results_clamp_to_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let expr = DiceExpr::parse("1d4-10").unwrap();
        assert_eq!(expr.roll(&mut rng), 0);
        assert_eq!(DiceExpr::parse("-3").unwrap().roll(&mut rng), 0);
    }

    #[test]
    fn test_huge_rolls_saturate() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let expr = DiceExpr {
            count: 100,
            sides: u32::MAX,
            modifier: i32::MAX,
        };
        assert_eq!(expr.max_value(), u32::MAX);
        assert!(expr.roll(&mut rng) >= expr.min_value());
    }
}
