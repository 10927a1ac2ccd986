mod approx_eq;
