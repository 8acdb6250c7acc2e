//! Ridge Regression
//!
//! L2 正則化付き最小二乗法（正規方程式による閉形式解）

use super::types::FittedTrend;
use crate::error::{Error, Result};

/// リッジ回帰モデル
///
/// 切片は正則化しない。特徴量と目的変数を中心化してから
/// `(XcᵀXc + αI) w = Xcᵀyc` を解き、`intercept = ȳ − x̄ᵀw` とする。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgeRegression {
    /// 正則化強度
    alpha: f64,
}

impl RidgeRegression {
    /// デフォルトの正則化強度
    pub const DEFAULT_ALPHA: f64 = 1.0;

    /// 新しいモデルを作成
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// フィットしてサンプル内予測を返す
    pub fn fit(&self, features: &[Vec<f64>], target: &[f64]) -> Result<FittedTrend> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(Error::InvalidInput(format!(
                "ridge alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }

        let n = features.len();
        if n == 0 {
            return Err(Error::InvalidInput("cannot fit on zero rows".to_string()));
        }
        if target.len() != n {
            return Err(Error::InvalidInput(format!(
                "feature rows ({}) and target length ({}) differ",
                n,
                target.len()
            )));
        }

        let p = features[0].len();
        if p == 0 {
            return Err(Error::InvalidInput("feature matrix has no columns".to_string()));
        }
        if let Some(bad) = features.iter().position(|row| row.len() != p) {
            return Err(Error::InvalidInput(format!(
                "row {} has {} features, expected {}",
                bad,
                features[bad].len(),
                p
            )));
        }

        let n_f = n as f64;
        let x_mean: Vec<f64> = (0..p)
            .map(|j| features.iter().map(|row| row[j]).sum::<f64>() / n_f)
            .collect();
        let y_mean = target.iter().sum::<f64>() / n_f;

        // 正規方程式 XcᵀXc と Xcᵀyc（α は固有値側で加える）
        let mut gram = vec![vec![0.0; p]; p];
        let mut rhs = vec![0.0; p];
        for (row, &y) in features.iter().zip(target) {
            let yc = y - y_mean;
            for i in 0..p {
                let xi = row[i] - x_mean[i];
                rhs[i] += xi * yc;
                for j in 0..p {
                    gram[i][j] += xi * (row[j] - x_mean[j]);
                }
            }
        }

        let coefficients = solve_ridge_system(gram, &rhs, self.alpha)?;
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(w, m)| w * m)
                .sum::<f64>();

        let mut fitted = FittedTrend {
            coefficients,
            intercept,
            alpha: self.alpha,
            predictions: Vec::with_capacity(n),
        };
        fitted.predictions = features.iter().map(|row| fitted.predict_row(row)).collect();

        Ok(fitted)
    }
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ALPHA)
    }
}

/// 固有値がこの相対幅以下の方向は数値的に退化しているとみなす
const RANK_TOLERANCE: f64 = 16.0 * f64::EPSILON;

/// Jacobi 法の最大スイープ数
const MAX_JACOBI_SWEEPS: usize = 64;

/// `(G + αI) w = r` を G の固有分解で解く
///
/// G = XcᵀXc は半正定値で、r は Xc の行空間に属するため、G の零空間方向の
/// 成分は厳密には 0 になる。丸めで生じた微小固有値の方向は 0 として扱い、
/// 共線な特徴量でも α の大きさによらず解が求まる。
fn solve_ridge_system(gram: Vec<Vec<f64>>, rhs: &[f64], alpha: f64) -> Result<Vec<f64>> {
    let n = rhs.len();
    let (eigenvalues, eigenvectors) = symmetric_eigen(gram);

    let scale = eigenvalues.iter().fold(0.0_f64, |acc, l| acc.max(l.abs()));
    let tolerance = RANK_TOLERANCE * n as f64 * scale;

    let mut w = vec![0.0; n];
    for (k, &lambda) in eigenvalues.iter().enumerate() {
        if lambda <= tolerance {
            if alpha == 0.0 {
                return Err(Error::InvalidInput(
                    "normal equations are singular; use a positive ridge alpha".to_string(),
                ));
            }
            continue;
        }

        let projection: f64 = (0..n).map(|i| eigenvectors[i][k] * rhs[i]).sum();
        let component = projection / (lambda + alpha);
        for (i, wi) in w.iter_mut().enumerate() {
            *wi += eigenvectors[i][k] * component;
        }
    }

    Ok(w)
}

/// 巡回 Jacobi 法による対称行列の固有分解
///
/// 固有値と、固有ベクトルを列に持つ直交行列を返す。
fn symmetric_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let norm = a
        .iter()
        .flatten()
        .map(|x| x * x)
        .sum::<f64>()
        .sqrt();

    for _ in 0..MAX_JACOBI_SWEEPS {
        let off_diagonal = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum::<f64>()
            .sqrt();
        if off_diagonal <= f64::EPSILON * norm {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q] == 0.0 {
                    continue;
                }

                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                a[p][q] = 0.0;
                a[q][p] = 0.0;

                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}
