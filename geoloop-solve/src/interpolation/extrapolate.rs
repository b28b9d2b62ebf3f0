use ninterp::interpolator::Extrapolate as Strategy;

/// How a table answers for arguments past its first or last entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extrapolate {
    /// Continue the end segment's slope.
    ///
    /// G-function tables use this so long simulations can run past the last
    /// computed ln(t/tₛ).
    Enable,
    /// Hold the end value.
    ///
    /// Property tables use this so a loop temperature outside the tabulated
    /// range reads the nearest tabulated property.
    Clamp,
}

impl From<Extrapolate> for Strategy<f64> {
    fn from(value: Extrapolate) -> Self {
        match value {
            Extrapolate::Enable => Strategy::Enable,
            Extrapolate::Clamp => Strategy::Clamp,
        }
    }
}
