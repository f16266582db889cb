//! # Orientation
//!
//! Display orientations are always absolute: a hotkey asks for "90 degrees",
//! never for "another 90 degrees". Degrees are clockwise, matching the way
//! the display content turns on screen.

use std::fmt;

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Zero degree Rotation; Don't rotate.
    Normal,
    /// 90 degree Clockwise Rotation; Screen "Up" will be on the right.
    RightUp,
    /// 180 degree Rotation; Screen will be flipped.
    Flipped,
    /// 270 degree Clockwise Rotation; Screen "Up" will be on the left side.
    LeftUp,
}

/// Which way the pixel grid lies relative to the panel's native mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    /// 0 and 180 degrees: width and height as the panel reports them natively.
    Native,
    /// 90 and 270 degrees: width and height trade places.
    Swapped,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Normal,
        Orientation::RightUp,
        Orientation::Flipped,
        Orientation::LeftUp,
    ];

    /// Convert to clockwise degrees.
    pub fn to_degrees(self) -> isize {
        match self {
            Self::Normal => 0,
            Self::RightUp => 90,
            Self::Flipped => 180,
            Self::LeftUp => 270,
        }
    }

    /// Attempt conversion from degrees to orientation.
    /// Positive value is clockwise, negative is counter clockwise.
    pub fn from_degrees(cw_degrees: isize) -> Result<Self> {
        match cw_degrees % 360 {
            0 => Ok(Self::Normal),
            90 | -270 => Ok(Self::RightUp),
            180 | -180 => Ok(Self::Flipped),
            270 | -90 => Ok(Self::LeftUp),
            other => Err(Error::InvalidDegrees(other)),
        }
    }

    /// Orientation code as display drivers count it: degrees / 90.
    pub fn code(self) -> u8 {
        (self.to_degrees() / 90) as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn axis(self) -> Axis {
        match self {
            Self::Normal | Self::Flipped => Axis::Native,
            Self::RightUp | Self::LeftUp => Axis::Swapped,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_to_degrees() -> Result<()> {
        assert_eq!(Orientation::Normal.to_degrees(), 0);
        assert_eq!(Orientation::RightUp.to_degrees(), 90);
        assert_eq!(Orientation::Flipped.to_degrees(), 180);
        assert_eq!(Orientation::LeftUp.to_degrees(), 270);
        Ok(())
    }

    #[test]
    fn degrees_to_orientation() -> Result<()> {
        // Clockwise degrees.
        assert_eq!(Orientation::from_degrees(0)?, Orientation::Normal);
        assert_eq!(Orientation::from_degrees(90)?, Orientation::RightUp);
        assert_eq!(Orientation::from_degrees(180)?, Orientation::Flipped);
        assert_eq!(Orientation::from_degrees(270)?, Orientation::LeftUp);
        assert_eq!(Orientation::from_degrees(360)?, Orientation::Normal);

        // Counter-clockwise degrees.
        assert_eq!(Orientation::from_degrees(-90)?, Orientation::LeftUp);
        assert_eq!(Orientation::from_degrees(-180)?, Orientation::Flipped);
        assert_eq!(Orientation::from_degrees(-270)?, Orientation::RightUp);

        // Test the modulo.
        assert_eq!(Orientation::from_degrees(810)?, Orientation::RightUp);
        assert_eq!(Orientation::from_degrees(-810)?, Orientation::LeftUp);

        // Test invalid input.
        assert!(Orientation::from_degrees(42).is_err());

        Ok(())
    }

    #[test]
    fn codes_follow_quarter_turns() -> Result<()> {
        for (code, orientation) in Orientation::ALL.iter().enumerate() {
            assert_eq!(orientation.code() as usize, code);
            assert_eq!(Orientation::from_code(code as u8), Some(*orientation));
        }
        assert_eq!(Orientation::from_code(4), None);
        Ok(())
    }

    #[test]
    fn axis_buckets() -> Result<()> {
        assert_eq!(Orientation::Normal.axis(), Axis::Native);
        assert_eq!(Orientation::Flipped.axis(), Axis::Native);
        assert_eq!(Orientation::RightUp.axis(), Axis::Swapped);
        assert_eq!(Orientation::LeftUp.axis(), Axis::Swapped);
        Ok(())
    }

    #[test]
    fn displays_as_degrees() {
        assert_eq!(Orientation::LeftUp.to_string(), "270°");
    }
}
