//! Built-in calibration data measured on the reference rig.
//!
//! The lighting tables pair positionally with [`TRUE_DISTANCES_M`]: entry `i`
//! is what the depth camera reported when the subject stood at
//! `TRUE_DISTANCES_M[i]`.

/// Number of samples in every lighting table.
pub const CURVE_LEN: usize = 96;

/// Ground-truth subject distances in meters, 0.5 m to 10.0 m in 0.1 m steps.
pub const TRUE_DISTANCES_M: [f64; CURVE_LEN] = [
    0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 1.6,
    1.7, 1.8, 1.9, 2.0, 2.1, 2.2, 2.3, 2.4, 2.5, 2.6, 2.7, 2.8,
    2.9, 3.0, 3.1, 3.2, 3.3, 3.4, 3.5, 3.6, 3.7, 3.8, 3.9, 4.0,
    4.1, 4.2, 4.3, 4.4, 4.5, 4.6, 4.7, 4.8, 4.9, 5.0, 5.1, 5.2,
    5.3, 5.4, 5.5, 5.6, 5.7, 5.8, 5.9, 6.0, 6.1, 6.2, 6.3, 6.4,
    6.5, 6.6, 6.7, 6.8, 6.9, 7.0, 7.1, 7.2, 7.3, 7.4, 7.5, 7.6,
    7.7, 7.8, 7.9, 8.0, 8.1, 8.2, 8.3, 8.4, 8.5, 8.6, 8.7, 8.8,
    8.9, 9.0, 9.1, 9.2, 9.3, 9.4, 9.5, 9.6, 9.7, 9.8, 9.9, 10.0,
];

/// Measured distances indoors with good lighting.
pub const INSIDE_GOOD_LIGHTING: [f64; CURVE_LEN] = [
    0.5, 0.6, 0.7, 0.81, 0.91, 1.01, 1.11, 1.21, 1.31, 1.41, 1.51, 1.62,
    1.73, 1.83, 1.92, 2.03, 2.13, 2.24, 2.34, 2.44, 2.55, 2.65, 2.76, 2.86,
    2.95, 3.08, 3.19, 3.29, 3.38, 3.5, 3.59, 3.69, 3.82, 3.91, 4.02, 4.13,
    4.24, 4.35, 4.45, 4.54, 4.66, 4.78, 4.87, 4.96, 5.07, 5.23, 5.34, 5.43,
    5.55, 5.63, 5.71, 5.81, 5.93, 6.11, 6.21, 6.28, 6.37, 6.47, 6.58, 6.69,
    6.8, 6.9, 7.05, 7.11, 7.26, 7.32, 7.46, 7.55, 7.65, 7.79, 7.91, 8.13,
    8.2, 8.34, 8.45, 8.59, 8.71, 8.74, 8.8, 8.88, 9.0, 9.04, 9.11, 9.22,
    9.37, 9.47, 9.68, 9.69, 9.77, 10.1, 10.21, 10.25, 10.34, 10.89, 10.96, 11.11,
];

/// Measured distances indoors with bad lighting.
pub const INSIDE_BAD_LIGHTING: [f64; CURVE_LEN] = [
    0.5, 0.6, 0.7, 0.81, 0.9, 1.01, 1.11, 1.2, 1.31, 1.41, 1.51, 1.61,
    1.71, 1.81, 1.92, 2.01, 2.12, 2.23, 2.33, 2.43, 2.53, 2.65, 2.74, 2.85,
    2.92, 3.05, 3.16, 3.27, 3.33, 3.47, 3.58, 3.68, 3.79, 3.88, 3.98, 4.06,
    4.2, 4.31, 4.4, 4.52, 4.63, 4.77, 4.85, 4.94, 5.03, 5.19, 5.29, 5.4,
    5.5, 5.59, 5.7, 5.78, 5.9, 6.1, 6.2, 6.31, 6.39, 6.48, 6.59, 6.7,
    6.82, 6.92, 7.08, 7.23, 7.37, 7.45, 7.53, 7.59, 7.65, 7.83, 7.96, 8.07,
    8.17, 8.38, 8.57, 8.59, 8.61, 8.71, 8.76, 8.85, 8.9, 9.06, 9.21, 9.28,
    9.5, 9.59, 9.69, 9.73, 9.88, 9.98, 10.27, 10.33, 10.55, 10.63, 10.9, 11.29,
];

/// Measured distances outdoors with good lighting.
///
/// Sample 76 was recorded out of order (8.57 after 8.69) and is held at its
/// predecessor so the table stays non-decreasing.
pub const OUTSIDE_GOOD_LIGHTING: [f64; CURVE_LEN] = [
    0.5, 0.6, 0.7, 0.81, 0.91, 1.01, 1.11, 1.21, 1.31, 1.42, 1.52, 1.62,
    1.72, 1.83, 1.93, 2.03, 2.14, 2.25, 2.34, 2.45, 2.56, 2.64, 2.76, 2.88,
    2.99, 3.05, 3.18, 3.25, 3.35, 3.45, 3.56, 3.66, 3.75, 3.87, 4.01, 4.12,
    4.2, 4.32, 4.41, 4.54, 4.63, 4.72, 4.8, 4.92, 4.99, 5.17, 5.27, 5.38,
    5.47, 5.54, 5.65, 5.76, 5.89, 6.01, 6.2, 6.27, 6.35, 6.48, 6.55, 6.73,
    6.86, 6.99, 7.05, 7.21, 7.31, 7.42, 7.5, 7.66, 7.8, 7.89, 8.05, 8.14,
    8.34, 8.43, 8.55, 8.69, 8.69, 8.8, 8.92, 9.0, 9.03, 9.09, 9.23, 9.29,
    9.5, 9.51, 9.56, 9.87, 10.01, 10.19, 10.24, 10.48, 10.6, 10.71, 10.71, 10.94,
];

/// Measured distances outdoors with bad lighting.
pub const OUTSIDE_BAD_LIGHTING: [f64; CURVE_LEN] = [
    0.5, 0.6, 0.7, 0.81, 0.9, 1.01, 1.11, 1.2, 1.31, 1.41, 1.51, 1.61,
    1.71, 1.81, 1.92, 2.01, 2.12, 2.23, 2.33, 2.43, 2.53, 2.65, 2.74, 2.85,
    2.92, 3.05, 3.16, 3.27, 3.33, 3.47, 3.58, 3.68, 3.79, 3.88, 3.98, 4.06,
    4.2, 4.31, 4.4, 4.52, 4.63, 4.77, 4.85, 4.94, 5.03, 5.19, 5.29, 5.4,
    5.5, 5.59, 5.7, 5.78, 5.9, 6.1, 6.2, 6.31, 6.39, 6.48, 6.59, 6.7,
    6.82, 6.92, 7.08, 7.23, 7.37, 7.45, 7.53, 7.59, 7.65, 7.83, 7.96, 8.07,
    8.17, 8.38, 8.57, 8.59, 8.61, 8.71, 8.76, 8.85, 8.9, 9.06, 9.21, 9.28,
    9.5, 9.59, 9.69, 9.73, 9.88, 9.98, 10.27, 10.33, 10.55, 10.63, 10.9, 11.29,
];

/// Lens focus ring calibration: `(motor steps from home, focus distance in meters)`.
pub const MOTOR_LUT_TABLE: [(i32, f64); 103] = [
    (0, 0.6), (10, 0.61), (20, 0.62), (30, 0.63), (40, 0.65), (50, 0.67),
    (60, 0.69), (70, 0.71), (75, 0.72), (80, 0.73), (85, 0.74), (90, 0.75),
    (95, 0.76), (100, 0.77), (105, 0.78), (110, 0.79), (115, 0.81), (120, 0.82),
    (125, 0.83), (130, 0.85), (135, 0.86), (140, 0.87), (145, 0.89), (150, 0.91),
    (155, 0.93), (160, 0.94), (165, 0.97), (170, 0.98), (175, 0.99), (180, 1.01),
    (185, 1.03), (190, 1.04), (195, 1.07), (200, 1.09), (205, 1.11), (210, 1.14),
    (215, 1.16), (220, 1.21), (225, 1.24), (230, 1.28), (235, 1.31), (240, 1.34),
    (245, 1.37), (250, 1.42), (255, 1.45), (260, 1.54), (265, 1.58), (270, 1.63),
    (275, 1.67), (280, 1.71), (285, 1.79), (290, 1.83), (295, 1.92), (300, 1.98),
    (305, 2.06), (310, 2.15), (312, 2.18), (314, 2.23), (316, 2.25), (318, 2.28),
    (320, 2.34), (322, 2.4), (324, 2.43), (326, 2.52), (328, 2.59), (330, 2.64),
    (332, 2.69), (334, 2.73), (336, 2.8), (338, 2.84), (340, 2.88), (342, 3.0),
    (344, 3.13), (346, 3.21), (348, 3.28), (350, 3.37), (352, 3.42), (354, 3.52),
    (356, 3.65), (358, 3.81), (360, 3.92), (362, 3.98), (364, 4.07), (366, 4.12),
    (368, 4.22), (370, 4.43), (372, 4.89), (374, 5.25), (376, 5.47), (378, 5.72),
    (380, 5.92), (382, 5.99), (384, 6.05), (386, 6.56), (388, 6.96), (390, 7.51),
    (392, 7.95), (394, 8.26), (396, 8.64), (398, 9.06), (400, 9.79), (402, 10.8),
    (404, 11.8),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighting_tables_non_decreasing() {
        for table in [
            &INSIDE_GOOD_LIGHTING,
            &INSIDE_BAD_LIGHTING,
            &OUTSIDE_GOOD_LIGHTING,
            &OUTSIDE_BAD_LIGHTING,
        ] {
            assert!(table.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_true_distances_span() {
        assert_eq!(TRUE_DISTANCES_M[0], 0.5);
        assert_eq!(TRUE_DISTANCES_M[CURVE_LEN - 1], 10.0);
    }

    #[test]
    fn test_motor_lut_starts_at_home() {
        assert_eq!(MOTOR_LUT_TABLE[0], (0, 0.6));
        assert!(MOTOR_LUT_TABLE.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 < w[1].1));
    }
}
