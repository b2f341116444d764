//! Record assembly shared by all versions.
//!
//! Every navigation message is a flat list of values once its lines are split:
//! three clock values on the first line followed by the broadcast orbit
//! values. The slot layout depends only on the constellation.

use crate::gnss::ephemeris::{
    Ephemeris, EphemerisData, GlonassEphemeris, KeplerEphemeris, SbasEphemeris,
};
use crate::gnss::types::{Constellation, Epoch, SatId};
use chrono::NaiveDateTime;

/// Values of a Keplerian message up to the transmission time.
const KEPLER_VALUES: usize = 28;

/// Values of a GLONASS or SBAS message.
const STATE_VECTOR_VALUES: usize = 15;

/// A message split into its parts, before interpretation.
#[derive(Debug, Clone)]
pub(crate) struct RawRecord {
    pub sat: SatId,
    pub toc: NaiveDateTime,
    pub values: Vec<f64>,
}

/// Map a raw message onto the payload of its constellation.
pub(crate) fn assemble(raw: RawRecord) -> Result<Ephemeris, String> {
    let RawRecord { sat, toc, values } = raw;
    let data = match sat.constellation {
        Constellation::Glonass => EphemerisData::Glonass(glonass(&values)?),
        Constellation::Sbas => EphemerisData::Sbas(sbas(&values)?),
        Constellation::Gps
        | Constellation::Galileo
        | Constellation::BeiDou
        | Constellation::Qzss
        | Constellation::Irnss => EphemerisData::Kepler(kepler(&values)?),
    };
    Ok(Ephemeris {
        sat,
        toc: Epoch::new(toc, sat.constellation.time_system()),
        data,
    })
}

fn require(values: &[f64], expected: usize) -> Result<(), String> {
    if values.len() < expected {
        return Err(format!(
            "expected at least {} values, found {}",
            expected,
            values.len()
        ));
    }
    Ok(())
}

fn kepler(v: &[f64]) -> Result<KeplerEphemeris, String> {
    require(v, KEPLER_VALUES)?;
    Ok(KeplerEphemeris {
        af0: v[0],
        af1: v[1],
        af2: v[2],
        iode: v[3],
        crs: v[4],
        delta_n: v[5],
        m0: v[6],
        cuc: v[7],
        e: v[8],
        cus: v[9],
        sqrt_a: v[10],
        toe: v[11],
        cic: v[12],
        omega0: v[13],
        cis: v[14],
        i0: v[15],
        crc: v[16],
        omega: v[17],
        omega_dot: v[18],
        i_dot: v[19],
        codes: v[20],
        week: v[21],
        l2p_flag: v[22],
        accuracy: v[23],
        health: v[24],
        tgd: v[25],
        iodc: v[26],
        transmission_time: v[27],
        fit_interval: v.get(28).copied(),
    })
}

fn glonass(v: &[f64]) -> Result<GlonassEphemeris, String> {
    require(v, STATE_VECTOR_VALUES)?;
    let channel = v[10];
    if !(-7.0..=13.0).contains(&channel) || channel.fract() != 0.0 {
        return Err(format!("invalid frequency number {}", channel));
    }
    Ok(GlonassEphemeris {
        minus_tau_n: v[0],
        gamma_n: v[1],
        frame_time: v[2],
        position: [v[3], v[7], v[11]],
        velocity: [v[4], v[8], v[12]],
        acceleration: [v[5], v[9], v[13]],
        health: v[6],
        frequency_number: channel as i8,
        age: v[14],
    })
}

fn sbas(v: &[f64]) -> Result<SbasEphemeris, String> {
    require(v, STATE_VECTOR_VALUES)?;
    Ok(SbasEphemeris {
        a_gf0: v[0],
        a_gf1: v[1],
        transmission_time: v[2],
        position: [v[3], v[7], v[11]],
        velocity: [v[4], v[8], v[12]],
        acceleration: [v[5], v[9], v[13]],
        health: v[6],
        ura: v[10],
        iodn: v[14],
    })
}
