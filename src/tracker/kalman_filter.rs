//! Constant-velocity Kalman filter over a box center, using ndarray for the
//! state and nalgebra for the 2x2 innovation inverse.
//!
//! State is `[cx, cy, vx, vy]`; measurements are `[cx, cy]`.

use ndarray::{Array1, Array2};

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_position: f64,
    std_velocity: f64,
    std_measurement: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let ndim = 2;
        let mut motion_mat = Array2::eye(2 * ndim);
        for i in 0..ndim {
            motion_mat[[i, ndim + i]] = 1.0;
        }

        let mut update_mat = Array2::zeros((ndim, 2 * ndim));
        for i in 0..ndim {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_position: 1.0,
            std_velocity: 0.5,
            std_measurement: 1.0,
        }
    }

    pub fn initiate(&self, measurement: [f64; 2]) -> (Array1<f64>, Array2<f64>) {
        let mean = Array1::from_vec(vec![measurement[0], measurement[1], 0.0, 0.0]);

        let std = [
            2.0 * self.std_position,
            2.0 * self.std_position,
            10.0 * self.std_velocity,
            10.0 * self.std_velocity,
        ];
        let cov = Array2::from_diag(&Array1::from_iter(std.iter().map(|s| s * s)));

        (mean, cov)
    }

    pub fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let std = [
            self.std_position,
            self.std_position,
            self.std_velocity,
            self.std_velocity,
        ];
        let motion_cov = Array2::from_diag(&Array1::from_iter(std.iter().map(|s| s * s)));

        let new_mean = self.motion_mat.dot(mean);
        let new_covariance = self.motion_mat.dot(covariance).dot(&self.motion_mat.t()) + motion_cov;

        (new_mean, new_covariance)
    }

    fn project(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let mut innovation_cov = Array2::<f64>::zeros((2, 2));
        for i in 0..2 {
            innovation_cov[[i, i]] = self.std_measurement * self.std_measurement;
        }
        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + innovation_cov;
        (mean_proj, covariance_proj)
    }

    /// Correct the state with a measured center.
    ///
    /// A singular innovation covariance leaves the state unchanged.
    pub fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 2],
    ) -> (Array1<f64>, Array2<f64>) {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let Some(s_inv) = invert_2x2(&projected_cov) else {
            return (mean.clone(), covariance.clone());
        };

        let innovation = Array1::from_vec(measurement.to_vec()) - projected_mean;

        // K = P * H^T * S^-1
        let pht = covariance.dot(&self.update_mat.t());
        let kalman_gain = pht.dot(&s_inv);

        let new_mean = mean + &kalman_gain.dot(&innovation);
        let new_covariance = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());

        (new_mean, new_covariance)
    }
}

fn invert_2x2(m: &Array2<f64>) -> Option<Array2<f64>> {
    let nm = nalgebra::Matrix2::new(m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]]);
    let inv = nm.try_inverse()?;
    Some(Array2::from_shape_fn((2, 2), |(i, j)| inv[(i, j)]))
}
