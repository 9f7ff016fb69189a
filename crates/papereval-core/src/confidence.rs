//! U-shaped trust curve for automated scores.
//!
//! Automated scores at the extremes are where the metrics are most likely
//! to be blind (an empty extraction, a copied reference), so fusion trusts
//! them least there and most around 0.5, where the human rating decides.
//!
//! ```text
//! confidence
//!   1.0 ┤          ╭──╮
//!       │       ╭──╯  ╰──╮
//!       │    ╭──╯        ╰──╮
//!   0.0 ┼────╯              ╰────
//!       0          0.5          1   automated score
//! ```

/// `1 - ((score - 0.5) * 2)^2`, clamped to `[0, 1]`.
///
/// Non-finite scores have no meaningful confidence and map to 0.
pub fn system_confidence(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    let distance = (score - 0.5) * 2.0;
    (1.0 - distance * distance).clamp(0.0, 1.0)
}
