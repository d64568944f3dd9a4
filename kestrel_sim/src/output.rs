// kestrel_sim/src/output.rs

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use kestrel_core::kinematics::rotation_vector_to_matrix;
use kestrel_core::models::imu::index;
use kestrel_core::time_array::DiscreteTimeArray;
use kestrel_core::types::{StateVector, TimeIndex, VectorKind};
use nalgebra::Vector3;
use tracing::info;

use crate::error::{SimError, SimResult};

/// The gravity direction seen in the body frame, `Rᵀ e_z`, for the
/// orientation stored in an IMU state vector.
pub fn gravity_direction(x: &StateVector) -> Vector3<f64> {
    let orientation = x.fixed_rows::<3>(index::ORIENTATION).into_owned();
    let r = rotation_vector_to_matrix(&orientation);
    (r.transpose() * Vector3::z()).normalize()
}

/// One line of the trajectory file.
#[derive(Debug, Clone, PartialEq)]
pub struct AttitudeError {
    pub k: TimeIndex,
    /// Angle between the true and the estimated gravity direction, in degrees.
    pub angle_deg: f64,
    pub g: Vector3<f64>,
    pub gh: Vector3<f64>,
}

/// Compares the tilt of the true states against the estimates at every time
/// index where both exist.
pub fn attitude_errors(
    states: &DiscreteTimeArray,
    estimates: &DiscreteTimeArray,
) -> SimResult<Vec<AttitudeError>> {
    estimates
        .iter()
        .map(|(k, xh)| {
            let x = states.get(k).ok_or(SimError::MissingSample {
                kind: VectorKind::State,
                k,
            })?;
            let g = gravity_direction(x);
            let gh = gravity_direction(xh);
            let angle_deg = g.dot(&gh).clamp(-1.0, 1.0).acos().to_degrees();
            Ok(AttitudeError { k, angle_deg, g, gh })
        })
        .collect()
}

/// Writes `k \t angle \t\t\t g \t\t\t gh`, one row per time index.
pub fn write_trajectory<W: Write>(out: &mut W, rows: &[AttitudeError]) -> SimResult<()> {
    for row in rows {
        writeln!(
            out,
            "{} \t {} \t\t\t {} {} {} \t\t\t {} {} {}",
            row.k,
            row.angle_deg,
            row.g.x,
            row.g.y,
            row.g.z,
            row.gh.x,
            row.gh.y,
            row.gh.z
        )?;
    }
    Ok(())
}

pub fn write_trajectory_file(path: &Path, rows: &[AttitudeError]) -> SimResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_trajectory(&mut out, rows)?;
    out.flush()?;
    info!(path = %path.display(), rows = rows.len(), "trajectory written");
    Ok(())
}

/// Mean and final attitude error, in degrees.
pub fn summarize(rows: &[AttitudeError]) -> Option<(f64, f64)> {
    let last = rows.last()?;
    let mean = rows.iter().map(|r| r.angle_deg).sum::<f64>() / rows.len() as f64;
    Some((mean, last.angle_deg))
}
