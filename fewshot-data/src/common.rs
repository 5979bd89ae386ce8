pub use anyhow::{bail, ensure, format_err, Context as _, Result};
pub use bbox::{AnchorBox, HW};
pub use indexmap::IndexMap;
pub use itertools::Itertools as _;
pub use log::{debug, info, trace, warn};
pub use noisy_float::prelude::*;
pub use rand::{prelude::*, rngs::StdRng};
pub use serde::{Deserialize, Serialize};
pub use serde_json::Value;
pub use std::{
    collections::HashMap,
    mem,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::{
        atomic::{self, AtomicBool},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
pub use tch::{Device, IndexOp, Kind, Tensor};
pub use tch_goodies::{load_rgb_image, TensorExt as _};
