use std::fmt::Debug;

pub use ::num::{cast, NumCast, ToPrimitive};

/// T values are primitive integers
pub trait PrimInt: ::num::PrimInt + Debug + Default {}

impl<T: ::num::PrimInt + Debug + Default> PrimInt for T {}

/// T values are float numbers that can be shared between rayon workers
pub trait Float: ::num::Float + Debug + Default + Send + Sync {}

impl<T: ::num::Float + Debug + Default + Send + Sync> Float for T {}
