//! Semi-classical Marcus hop rates.
//!
//! The non-adiabatic Marcus expression for the transfer rate between two
//! localized states separated by a site-energy difference ΔE:
//!
//!   k = (2π/ħ) · |H_AB|² · (4π·λ·k_B·T)^(-1/2) · exp(−(ΔE + λ)² / (4·λ·k_B·T))
//!
//! with reorganization energy λ and electronic coupling H_AB.  Energies are
//! in electron-volts, temperature in kelvin, rates in 1/s.  Rates built here
//! satisfy detailed balance, which the coarse-graining engine assumes.

use crate::{LatticeError, LatticeResult};

/// Reduced Planck constant, eV·s.
const HBAR: f64 = 6.582_119_569e-16;

/// Boltzmann constant, eV/K.
const BOLTZMANN: f64 = 8.617_333_262e-5;

/// A Marcus rate calculator with fixed λ, coupling, and temperature.
#[derive(Clone, Copy, Debug)]
pub struct Marcus {
    /// Prefactor `(2π/ħ)·|H_AB|²·(4π·λ·k_B·T)^(-1/2)`, 1/s.
    prefactor: f64,
    /// `4·λ·k_B·T`, eV².
    gaussian_denominator: f64,
    reorganization_energy: f64,
}

impl Marcus {
    /// Build a calculator from reorganization energy λ (eV), electronic
    /// coupling |H_AB| (eV), and temperature (K).
    pub fn new(
        reorganization_energy: f64,
        electronic_coupling: f64,
        temperature: f64,
    ) -> LatticeResult<Self> {
        if !(reorganization_energy.is_finite() && reorganization_energy > 0.0) {
            return Err(LatticeError::NonPositiveParameter {
                name: "reorganization energy",
                value: reorganization_energy,
            });
        }
        if !(electronic_coupling.is_finite() && electronic_coupling > 0.0) {
            return Err(LatticeError::NonPositiveParameter {
                name: "electronic coupling",
                value: electronic_coupling,
            });
        }
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(LatticeError::NonPositiveParameter {
                name: "temperature",
                value: temperature,
            });
        }

        let thermal = reorganization_energy * BOLTZMANN * temperature;
        let prefactor = 2.0 * std::f64::consts::PI / HBAR
            * electronic_coupling.powi(2)
            / (4.0 * std::f64::consts::PI * thermal).sqrt();
        Ok(Self {
            prefactor,
            gaussian_denominator: 4.0 * thermal,
            reorganization_energy,
        })
    }

    /// Hop rate for a site-energy difference `ΔE = E_to − E_from`, in 1/s.
    pub fn rate(&self, delta_energy: f64) -> f64 {
        let barrier = delta_energy + self.reorganization_energy;
        self.prefactor * (-(barrier * barrier) / self.gaussian_denominator).exp()
    }

    pub fn reorganization_energy(&self) -> f64 {
        self.reorganization_energy
    }
}
