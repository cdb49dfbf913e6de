/*
Copyright 2021 Jakub Lewandowski

This file is part of Large-Scale Forcing Engine (LSFE).

Large-Scale Forcing Engine (LSFE) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Large-Scale Forcing Engine (LSFE) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Large-Scale Forcing Engine (LSFE). If not, see https://www.gnu.org/licenses/.
*/

//! Module containing the search of the level segment
//! enclosing a value in a monotonic axis.

use crate::errors::SearchError;

/// Finds index `k` of the segment `[array[k], array[k+1]]`
/// which contains `x`.
///
/// The array can be sorted ascendingly or descendingly.
/// Values outside of the array range are assigned to the
/// closest edge segment, so the result can be used for
/// linear extrapolation. Array must have at least two elements.
pub fn find_segment<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    if array.len() < 2 {
        return Err(SearchError::TooShort(array.len()));
    }

    let ascending = array[0] < array[array.len() - 1];

    // points lying strictly before x in the direction of the axis
    let before = array.partition_point(|level| {
        if ascending {
            level < x
        } else {
            level > x
        }
    });

    Ok(before.saturating_sub(1).min(array.len() - 2))
}
