//! The scheme catalogue, addressable by name.

use std::fmt;
use std::str::FromStr;

use simframe_core::FrameError;
use simframe_engine::Scheme;

use crate::adaptive::AdaptiveScheme;
use crate::explicit::ExplicitScheme;
use crate::implicit::{ImplicitEuler, ImplicitMidpoint};

/// Every built-in scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemeKind {
    /// Forward Euler.
    Euler,
    /// Explicit midpoint.
    Midpoint,
    /// Heun, second order.
    Heun2,
    /// Ralston, second order.
    Ralston2,
    /// Kutta, third order.
    Kutta3,
    /// Heun, third order.
    Heun3,
    /// Ralston, third order.
    Ralston3,
    /// Strong-stability-preserving, third order.
    Ssprk3,
    /// Classical Runge–Kutta.
    Rk4,
    /// 3/8-rule.
    Rule38,
    /// Ralston, fourth order.
    Ralston4,
    /// Adaptive Heun–Euler.
    HeunEuler,
    /// Adaptive Runge–Kutta–Fehlberg 1(2).
    Fehlberg,
    /// Adaptive Bogacki–Shampine.
    BogackiShampine,
    /// Adaptive Gottlieb–Shu.
    GottliebShu,
    /// Adaptive Cash–Karp.
    CashKarp,
    /// Adaptive Dormand–Prince.
    DormandPrince,
    /// Backward Euler, direct solve.
    ImplicitEuler,
    /// Backward Euler, GMRES.
    ImplicitEulerGmres,
    /// Implicit midpoint, direct solve.
    ImplicitMidpoint,
}

impl SchemeKind {
    /// All schemes, explicit first.
    pub const ALL: [SchemeKind; 20] = [
        Self::Euler,
        Self::Midpoint,
        Self::Heun2,
        Self::Ralston2,
        Self::Kutta3,
        Self::Heun3,
        Self::Ralston3,
        Self::Ssprk3,
        Self::Rk4,
        Self::Rule38,
        Self::Ralston4,
        Self::HeunEuler,
        Self::Fehlberg,
        Self::BogackiShampine,
        Self::GottliebShu,
        Self::CashKarp,
        Self::DormandPrince,
        Self::ImplicitEuler,
        Self::ImplicitEulerGmres,
        Self::ImplicitMidpoint,
    ];

    /// The scheme's name, as reported by [`Scheme::name`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Euler => "euler",
            Self::Midpoint => "midpoint",
            Self::Heun2 => "heun2",
            Self::Ralston2 => "ralston2",
            Self::Kutta3 => "kutta3",
            Self::Heun3 => "heun3",
            Self::Ralston3 => "ralston3",
            Self::Ssprk3 => "ssprk3",
            Self::Rk4 => "rk4",
            Self::Rule38 => "rk4-3/8",
            Self::Ralston4 => "ralston4",
            Self::HeunEuler => "heun-euler",
            Self::Fehlberg => "fehlberg",
            Self::BogackiShampine => "bogacki-shampine",
            Self::GottliebShu => "gottlieb-shu",
            Self::CashKarp => "cash-karp",
            Self::DormandPrince => "dormand-prince",
            Self::ImplicitEuler => "implicit-euler",
            Self::ImplicitEulerGmres => "implicit-euler-gmres",
            Self::ImplicitMidpoint => "implicit-midpoint",
        }
    }

    /// Looks a scheme up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Order of accuracy.
    pub fn order(self) -> u8 {
        match self {
            Self::Euler | Self::ImplicitEuler | Self::ImplicitEulerGmres => 1,
            Self::Midpoint
            | Self::Heun2
            | Self::Ralston2
            | Self::HeunEuler
            | Self::Fehlberg
            | Self::ImplicitMidpoint => 2,
            Self::Kutta3
            | Self::Heun3
            | Self::Ralston3
            | Self::Ssprk3
            | Self::BogackiShampine
            | Self::GottliebShu => 3,
            Self::Rk4 | Self::Rule38 | Self::Ralston4 => 4,
            Self::CashKarp | Self::DormandPrince => 5,
        }
    }

    /// Whether the scheme controls its own step size.
    pub fn is_adaptive(self) -> bool {
        matches!(
            self,
            Self::HeunEuler
                | Self::Fehlberg
                | Self::BogackiShampine
                | Self::GottliebShu
                | Self::CashKarp
                | Self::DormandPrince
        )
    }

    /// Whether the scheme needs a Jacobian.
    pub fn is_implicit(self) -> bool {
        matches!(
            self,
            Self::ImplicitEuler | Self::ImplicitEulerGmres | Self::ImplicitMidpoint
        )
    }

    /// An instance with default parameters.
    pub fn build(self) -> Box<dyn Scheme> {
        match self {
            Self::Euler => Box::new(ExplicitScheme::euler()),
            Self::Midpoint => Box::new(ExplicitScheme::midpoint()),
            Self::Heun2 => Box::new(ExplicitScheme::heun2()),
            Self::Ralston2 => Box::new(ExplicitScheme::ralston2()),
            Self::Kutta3 => Box::new(ExplicitScheme::kutta3()),
            Self::Heun3 => Box::new(ExplicitScheme::heun3()),
            Self::Ralston3 => Box::new(ExplicitScheme::ralston3()),
            Self::Ssprk3 => Box::new(ExplicitScheme::ssprk3()),
            Self::Rk4 => Box::new(ExplicitScheme::rk4()),
            Self::Rule38 => Box::new(ExplicitScheme::rule38()),
            Self::Ralston4 => Box::new(ExplicitScheme::ralston4()),
            Self::HeunEuler => Box::new(AdaptiveScheme::heun_euler()),
            Self::Fehlberg => Box::new(AdaptiveScheme::fehlberg()),
            Self::BogackiShampine => Box::new(AdaptiveScheme::bogacki_shampine()),
            Self::GottliebShu => Box::new(AdaptiveScheme::gottlieb_shu()),
            Self::CashKarp => Box::new(AdaptiveScheme::cash_karp()),
            Self::DormandPrince => Box::new(AdaptiveScheme::dormand_prince()),
            Self::ImplicitEuler => Box::new(ImplicitEuler::direct()),
            Self::ImplicitEulerGmres => Box::new(ImplicitEuler::default_gmres()),
            Self::ImplicitMidpoint => Box::new(ImplicitMidpoint::direct()),
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemeKind {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| FrameError::configuration(format!("unknown scheme '{s}'")))
    }
}
