mod t_helm;
